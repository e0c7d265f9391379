//! Legacy line-oriented configuration format.
//!
//! One directive per line: a keyword, then comma-delimited positional
//! fields. `#` and `//` introduce comment lines; blank lines are skipped.
//! The format has no nesting, so device-scoped directives name their device
//! by label and the parser groups them onto the matching [`Device`] entry.
//!
//! [`parse`] converts legacy text into a validated
//! [`Document`](crate::schema::Document); [`serialize`] is its inverse, and
//! re-parsing serializer output yields an equal document.
//!
//! [`Device`]: crate::schema::Device

mod parser;
mod writer;

pub use parser::parse;
pub use writer::serialize;

/// Field delimiter of the line format.
pub(crate) const DELIM: char = ',';

/// Directive keywords, with their historical spellings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Keyword {
    Device,
    PreInitProperty,
    Property,
    Delay,
    FocusDirection,
    Label,
    Parent,
    ConfigGroup,
    ConfigPixelSize,
    PixelSizeUm,
    PixelSizeAffine,
    PixelSizeAngleDxdz,
    PixelSizeAngleDydz,
    PixelSizeOptimalZUm,
    /// Retired directive, recognized so old files still load
    Config,
    /// Retired directive, recognized so old files still load
    Equipment,
    /// Retired directive, recognized so old files still load
    ImageSynchro,
}

impl Keyword {
    pub(crate) fn parse(token: &str) -> Option<Self> {
        Some(match token {
            "Device" => Keyword::Device,
            "PreInitProperty" => Keyword::PreInitProperty,
            "Property" => Keyword::Property,
            "Delay" => Keyword::Delay,
            "FocusDirection" => Keyword::FocusDirection,
            "Label" => Keyword::Label,
            "Parent" => Keyword::Parent,
            "ConfigGroup" => Keyword::ConfigGroup,
            "ConfigPixelSize" => Keyword::ConfigPixelSize,
            "PixelSize_um" => Keyword::PixelSizeUm,
            "PixelSizeAffine" => Keyword::PixelSizeAffine,
            "PixelSizeAngle_dxdz" => Keyword::PixelSizeAngleDxdz,
            "PixelSizeAngle_dydz" => Keyword::PixelSizeAngleDydz,
            "PixelSizeOptimalZ_Um" => Keyword::PixelSizeOptimalZUm,
            "Config" => Keyword::Config,
            "Equipment" => Keyword::Equipment,
            "ImageSynchro" => Keyword::ImageSynchro,
            _ => return None,
        })
    }

    pub(crate) fn as_str(self) -> &'static str {
        match self {
            Keyword::Device => "Device",
            Keyword::PreInitProperty => "PreInitProperty",
            Keyword::Property => "Property",
            Keyword::Delay => "Delay",
            Keyword::FocusDirection => "FocusDirection",
            Keyword::Label => "Label",
            Keyword::Parent => "Parent",
            Keyword::ConfigGroup => "ConfigGroup",
            Keyword::ConfigPixelSize => "ConfigPixelSize",
            Keyword::PixelSizeUm => "PixelSize_um",
            Keyword::PixelSizeAffine => "PixelSizeAffine",
            Keyword::PixelSizeAngleDxdz => "PixelSizeAngle_dxdz",
            Keyword::PixelSizeAngleDydz => "PixelSizeAngle_dydz",
            Keyword::PixelSizeOptimalZUm => "PixelSizeOptimalZ_Um",
            Keyword::Config => "Config",
            Keyword::Equipment => "Equipment",
            Keyword::ImageSynchro => "ImageSynchro",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keyword_spellings_round_trip() {
        for keyword in [
            Keyword::Device,
            Keyword::PreInitProperty,
            Keyword::Property,
            Keyword::Delay,
            Keyword::FocusDirection,
            Keyword::Label,
            Keyword::Parent,
            Keyword::ConfigGroup,
            Keyword::ConfigPixelSize,
            Keyword::PixelSizeUm,
            Keyword::PixelSizeAffine,
            Keyword::PixelSizeAngleDxdz,
            Keyword::PixelSizeAngleDydz,
            Keyword::PixelSizeOptimalZUm,
            Keyword::Config,
            Keyword::Equipment,
            Keyword::ImageSynchro,
        ] {
            assert_eq!(Keyword::parse(keyword.as_str()), Some(keyword));
        }
    }

    #[test]
    fn test_keywords_are_case_sensitive() {
        assert_eq!(Keyword::parse("device"), None);
        assert_eq!(Keyword::parse("PIXELSIZE_UM"), None);
        assert_eq!(Keyword::parse(""), None);
    }
}
