use super::*;
use std::io::Write;

/// An empty file yields the defaults.
#[test]
fn test_empty_config_is_default() {
  assert_eq!(ToolConfig::parse("").unwrap(), ToolConfig::default());
}

/// Every field parses from its lowercase spelling.
#[test]
fn test_parse_all_fields() {
  let config = ToolConfig::parse(
    r#"
value_type = "f32"
filter_size = 3
anchor = "centered"
"#,
  )
  .unwrap();
  assert_eq!(config.value_type, ValueType::F32);
  assert_eq!(config.filter_size, 3);
  assert_eq!(config.anchor, Anchor::Centered);
}

/// A zero filter size is rejected at load time.
#[test]
fn test_zero_filter_rejected() {
  assert!(ToolConfig::parse("filter_size = 0").is_err());
}

/// Filter sizes past the finest grid are rejected at load time.
#[test]
fn test_oversized_filter_rejected() {
  assert!(ToolConfig::parse("filter_size = 3000000").is_err());
  let ok = format!("filter_size = {}", MAX_FILTER_SIZE);
  assert!(ToolConfig::parse(&ok).is_ok());
}

/// Unknown keys are reported instead of silently ignored.
#[test]
fn test_unknown_key_rejected() {
  assert!(ToolConfig::parse("filter = 3").is_err());
}

/// Flags replace file values; absent flags keep them.
#[test]
fn test_overrides() {
  let file = ToolConfig::parse("value_type = \"u32\"\nfilter_size = 3").unwrap();
  let merged = file.with_overrides(None, Some(5), Some(Anchor::Centered)).unwrap();
  assert_eq!(merged.value_type, ValueType::U32);
  assert_eq!(merged.filter_size, 5);
  assert_eq!(merged.anchor, Anchor::Centered);

  assert!(file.with_overrides(None, Some(0), None).is_err());
}

/// load reads from disk and names the path on failure.
#[test]
fn test_load_from_file() {
  let mut file = tempfile::NamedTempFile::new().unwrap();
  writeln!(file, "value_type = \"bool\"").unwrap();
  assert_eq!(ToolConfig::load(file.path()).unwrap().value_type, ValueType::Bool);

  let missing = file.path().with_extension("missing");
  let err = ToolConfig::load(&missing).unwrap_err();
  assert!(err.to_string().contains("Failed to read config file"));
}
