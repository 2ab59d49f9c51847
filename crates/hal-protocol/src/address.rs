//! Object identifiers and property addresses
//!
//! A property is located by an object id plus a (selector, scope, element)
//! triple. Selectors and scopes are four-character codes on the platform;
//! the known ones get their own variants and everything else is carried
//! verbatim in `Other` so that mismatched requests can still be expressed.

use std::fmt;

/// Pack a four-character code into its big-endian `u32` form
pub const fn fourcc(code: &[u8; 4]) -> u32 {
    u32::from_be_bytes(*code)
}

/// Format a four-character code for diagnostics (`'dev#'`), falling back to hex
pub fn fourcc_display(code: u32) -> String {
    let bytes = code.to_be_bytes();
    if bytes.iter().all(|b| b.is_ascii_graphic() || *b == b' ') {
        format!("'{}'", String::from_utf8_lossy(&bytes))
    } else {
        format!("0x{:08X}", code)
    }
}

/// Identifier of an object in the property directory
///
/// Device ids are opaque and caller-assigned. The system object is the fixed
/// id `1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct AudioObjectId(pub u32);

impl AudioObjectId {
    /// The "no device" sentinel
    pub const UNKNOWN: AudioObjectId = AudioObjectId(u32::MAX);

    /// The singleton system object
    pub const SYSTEM_OBJECT: AudioObjectId = AudioObjectId(1);

    /// Size in bytes of an id in a property payload
    pub const BYTE_SIZE: u32 = 4;

    /// Get the raw id value
    pub fn as_u32(&self) -> u32 {
        self.0
    }

    /// Whether this is the system object
    pub fn is_system(&self) -> bool {
        *self == Self::SYSTEM_OBJECT
    }
}

impl fmt::Display for AudioObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if *self == Self::UNKNOWN {
            write!(f, "<unknown>")
        } else {
            write!(f, "{}", self.0)
        }
    }
}

impl From<u32> for AudioObjectId {
    fn from(raw: u32) -> Self {
        AudioObjectId(raw)
    }
}

/// The attribute a request is about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PropertySelector {
    /// List of all devices (`'dev#'`)
    Devices,
    /// Default output device (`'dOut'`)
    DefaultOutputDevice,
    /// Default system output device, used for alerts (`'sOut'`)
    DefaultSystemOutputDevice,
    /// Stream configuration as a buffer list (`'slay'`)
    StreamConfiguration,
    /// Persistent device UID string (`'uid '`)
    DeviceUid,
    /// Device display name string (`'lnam'`)
    DeviceName,
    /// Any other selector code
    Other(u32),
}

impl PropertySelector {
    /// Get the four-character code
    pub fn code(&self) -> u32 {
        match self {
            Self::Devices => fourcc(b"dev#"),
            Self::DefaultOutputDevice => fourcc(b"dOut"),
            Self::DefaultSystemOutputDevice => fourcc(b"sOut"),
            Self::StreamConfiguration => fourcc(b"slay"),
            Self::DeviceUid => fourcc(b"uid "),
            Self::DeviceName => fourcc(b"lnam"),
            Self::Other(code) => *code,
        }
    }

    /// Map a raw code back to a selector
    pub fn from_code(code: u32) -> Self {
        [
            Self::Devices,
            Self::DefaultOutputDevice,
            Self::DefaultSystemOutputDevice,
            Self::StreamConfiguration,
            Self::DeviceUid,
            Self::DeviceName,
        ]
        .into_iter()
        .find(|s| s.code() == code)
        .unwrap_or_else(|| {
            tracing::trace!("Unrecognized property selector {}", fourcc_display(code));
            Self::Other(code)
        })
    }
}

impl fmt::Display for PropertySelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&fourcc_display(self.code()))
    }
}

/// Which side of an object a property applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PropertyScope {
    /// Object-wide (`'glob'`)
    Global,
    /// Input side (`'inpt'`)
    Input,
    /// Output side (`'outp'`)
    Output,
    /// Any other scope code
    Other(u32),
}

impl PropertyScope {
    /// Get the four-character code
    pub fn code(&self) -> u32 {
        match self {
            Self::Global => fourcc(b"glob"),
            Self::Input => fourcc(b"inpt"),
            Self::Output => fourcc(b"outp"),
            Self::Other(code) => *code,
        }
    }

    /// Map a raw code back to a scope
    pub fn from_code(code: u32) -> Self {
        [Self::Global, Self::Input, Self::Output]
            .into_iter()
            .find(|s| s.code() == code)
            .unwrap_or(Self::Other(code))
    }
}

impl fmt::Display for PropertyScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&fourcc_display(self.code()))
    }
}

/// Element index within a scope
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct PropertyElement(pub u32);

impl PropertyElement {
    /// The main element (element 0)
    pub const MAIN: PropertyElement = PropertyElement(0);
}

impl fmt::Display for PropertyElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A (selector, scope, element) triple
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PropertyAddress {
    pub selector: PropertySelector,
    pub scope: PropertyScope,
    pub element: PropertyElement,
}

impl PropertyAddress {
    /// Create an address
    pub const fn new(
        selector: PropertySelector,
        scope: PropertyScope,
        element: PropertyElement,
    ) -> Self {
        Self {
            selector,
            scope,
            element,
        }
    }

    /// Address in the global scope on the main element
    pub const fn global(selector: PropertySelector) -> Self {
        Self::new(selector, PropertyScope::Global, PropertyElement::MAIN)
    }

    /// Address in the output scope on the main element
    pub const fn output(selector: PropertySelector) -> Self {
        Self::new(selector, PropertyScope::Output, PropertyElement::MAIN)
    }

    /// The system device-list address, the only one listeners may use
    pub const DEVICES: PropertyAddress = PropertyAddress::global(PropertySelector::Devices);
}

impl fmt::Display for PropertyAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{{selector {}, scope {}, element {}}}",
            self.selector, self.scope, self.element
        )
    }
}
