use crate::error::{SslcError, SslcResult};
use crate::layout::SLOT_CAPACITY;
use serde::Serialize;
use strum::{Display, EnumString};

/// How a member's storage footprint was determined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    Elementary,
    Mapping,
    Array,
    Struct,
    Enum,
    Contract,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Field {
    pub name: String,
    pub byte_size: u8,
    pub line: usize,
    pub kind: FieldKind,
    pub type_name: Option<String>,
    /// Source line of the declaration, without trailing comment.
    pub declaration: String,
}

/// One struct definition with its members in declaration order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Record {
    pub name: String,
    pub container: Option<String>,
    pub line: usize,
    pub fields: Vec<Field>,
}

impl Record {
    pub fn sizes(&self) -> Vec<u8> {
        self.fields.iter().map(|f| f.byte_size).collect()
    }

    pub fn total_bytes(&self) -> u32 {
        self.fields.iter().map(|f| f.byte_size as u32).sum()
    }
}

/// Storage size of a value type, `None` when the name is not a builtin.
pub fn elementary_size(type_name: &str) -> Option<u8> {
    match type_name {
        "bool" | "byte" => return Some(1),
        "address" => return Some(20),
        "uint" | "int" | "bytes" | "string" => return Some(SLOT_CAPACITY as u8),
        _ => {}
    }

    if let Some(width) = type_name
        .strip_prefix("uint")
        .or_else(|| type_name.strip_prefix("int"))
    {
        let bits: u32 = width.parse().ok()?;
        if bits == 0 || bits > 256 || bits % 8 != 0 || width.starts_with('0') {
            return None;
        }
        return Some((bits / 8) as u8);
    }

    if let Some(width) = type_name.strip_prefix("bytes") {
        let bytes: u32 = width.parse().ok()?;
        if bytes == 0 || bytes > SLOT_CAPACITY || width.starts_with('0') {
            return None;
        }
        return Some(bytes as u8);
    }

    None
}

/// Smallest index width able to address every member of an enum.
pub fn enum_byte_width(name: &str, members: u64) -> SslcResult<u8> {
    match members {
        0..=0xFF => Ok(1),
        0x100..=0xFFFF => Ok(2),
        0x1_0000..=0x100_0000 => Ok(3),
        0x100_0001..=0xFFFF_FFFF => Ok(4),
        _ => Err(SslcError::EnumTooLarge {
            name: name.to_string(),
            members,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("bool", Some(1))]
    #[case("address", Some(20))]
    #[case("uint", Some(32))]
    #[case("int", Some(32))]
    #[case("uint8", Some(1))]
    #[case("int24", Some(3))]
    #[case("uint128", Some(16))]
    #[case("uint256", Some(32))]
    #[case("bytes", Some(32))]
    #[case("string", Some(32))]
    #[case("bytes1", Some(1))]
    #[case("bytes20", Some(20))]
    #[case("bytes32", Some(32))]
    #[case("byte", Some(1))]
    #[case("uint7", None)]
    #[case("uint264", None)]
    #[case("uint08", None)]
    #[case("bytes33", None)]
    #[case("bytes0", None)]
    #[case("fixed", None)]
    #[case("Position", None)]
    fn test_elementary_sizes(#[case] name: &str, #[case] expected: Option<u8>) {
        assert_eq!(elementary_size(name), expected);
    }

    #[rstest]
    #[case(2, 1)]
    #[case(255, 1)]
    #[case(256, 2)]
    #[case(65_535, 2)]
    #[case(65_536, 3)]
    #[case(16_777_216, 3)]
    #[case(16_777_217, 4)]
    #[case(4_294_967_295, 4)]
    fn test_enum_widths(#[case] members: u64, #[case] width: u8) {
        assert_eq!(enum_byte_width("E", members).unwrap(), width);
    }

    #[test]
    fn test_enum_too_large() {
        let err = enum_byte_width("Huge", 4_294_967_296).unwrap_err();
        assert!(matches!(err, SslcError::EnumTooLarge { members: 4_294_967_296, .. }));
    }

    #[test]
    fn test_field_kind_names() {
        assert_eq!(FieldKind::Mapping.to_string(), "mapping");
        assert_eq!("contract".parse::<FieldKind>().unwrap(), FieldKind::Contract);
    }
}
