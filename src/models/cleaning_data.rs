use serde::{Deserialize, Serialize};

/// A record of a known-dirty plugin revision: the CRC-32 of the dirty file,
/// the utility that cleans it, counts of the dirty record classes, and an
/// informational message.
///
/// A loaded plugin is reported dirty iff its CRC equals a recorded CRC for
/// its name.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CleaningData {
    pub crc: u32,

    #[serde(rename = "util")]
    pub cleaning_utility: String,

    #[serde(default, skip_serializing_if = "is_zero")]
    pub itm: u32,

    #[serde(rename = "udr", default, skip_serializing_if = "is_zero")]
    pub deleted_references: u32,

    #[serde(rename = "nav", default, skip_serializing_if = "is_zero")]
    pub deleted_navmeshes: u32,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub info: String,
}

impl CleaningData {
    pub fn new(crc: u32, cleaning_utility: impl Into<String>) -> Self {
        CleaningData {
            crc,
            cleaning_utility: cleaning_utility.into(),
            itm: 0,
            deleted_references: 0,
            deleted_navmeshes: 0,
            info: String::new(),
        }
    }

    /// Summary of the dirty record counts, e.g. "2 ITMs, 1 deleted reference".
    pub fn summary(&self) -> String {
        let mut parts = Vec::new();
        if self.itm > 0 {
            parts.push(format!("{} ITMs", self.itm));
        }
        if self.deleted_references > 0 {
            parts.push(format!("{} deleted references", self.deleted_references));
        }
        if self.deleted_navmeshes > 0 {
            parts.push(format!("{} deleted navmeshes", self.deleted_navmeshes));
        }
        if parts.is_empty() {
            "Nothing recorded".to_string()
        } else {
            parts.join(", ")
        }
    }
}

impl PartialEq for CleaningData {
    fn eq(&self, other: &Self) -> bool {
        self.crc == other.crc
    }
}

impl Eq for CleaningData {}

fn is_zero(value: &u32) -> bool {
    *value == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_full_record() {
        let data: CleaningData = serde_yaml_ng::from_str(
            "{crc: 0xDEADBEEF, util: 'TES5Edit v3.11', itm: 4, udr: 1, nav: 0, info: 'Needs cleaning.'}",
        )
        .unwrap();
        assert_eq!(data.crc, 0xDEAD_BEEF);
        assert_eq!(data.cleaning_utility, "TES5Edit v3.11");
        assert_eq!(data.itm, 4);
        assert_eq!(data.deleted_references, 1);
        assert_eq!(data.deleted_navmeshes, 0);
    }

    #[test]
    fn test_counts_default_to_zero() {
        let data: CleaningData =
            serde_yaml_ng::from_str("{crc: 12345, util: xEdit}").unwrap();
        assert_eq!(data.itm, 0);
        assert_eq!(data.deleted_references, 0);
    }

    #[test]
    fn test_equality_keys_on_crc() {
        let a = CleaningData::new(1, "xEdit");
        let mut b = CleaningData::new(1, "TES5Edit");
        b.itm = 9;
        assert_eq!(a, b);
        assert_ne!(a, CleaningData::new(2, "xEdit"));
    }

    #[test]
    fn test_summary() {
        let mut data = CleaningData::new(1, "xEdit");
        data.itm = 2;
        data.deleted_navmeshes = 1;
        let summary = data.summary();
        assert!(summary.contains("2 ITMs"));
        assert!(summary.contains("1 deleted navmeshes"));
    }

    #[test]
    fn test_unknown_keys_rejected() {
        let result: Result<CleaningData, _> =
            serde_yaml_ng::from_str("{crc: 1, util: xEdit, bogus: true}");
        assert!(result.is_err());
    }
}
