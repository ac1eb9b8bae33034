//! Integration tests for condition evaluation through the game handle:
//! message filtering, metadata resolution, and cache epoch semantics.

mod common;

use std::fs;

use common::{build_game, record, record_with_version, utf8_dir, write_list};
use tempfile::TempDir;

#[test]
fn test_message_on_missing_file_is_omitted() {
    let dir = TempDir::new().unwrap();
    let data = utf8_dir(&dir);
    let master = write_list(
        &data,
        "masterlist.yaml",
        r#"
globals:
  - type: say
    content: 'Always shown.'
  - type: warn
    content: 'Needs a file.'
    condition: 'file("Missing.esp")'
"#,
    );

    let mut game = build_game(&data, vec![("Base.esm", record(true, &[]))], &[], &[]);
    game.load_lists(Some(&master), None).unwrap();

    let unevaluated = game.general_messages(false).unwrap();
    assert_eq!(unevaluated.len(), 2);

    let visible = game.general_messages(true).unwrap();
    assert_eq!(visible.len(), 1);
    assert_eq!(visible[0].content[0].text, "Always shown.");
}

#[test]
fn test_version_condition_against_plugin_description() {
    let dir = TempDir::new().unwrap();
    let data = utf8_dir(&dir);
    let master = write_list(
        &data,
        "masterlist.yaml",
        r#"
globals:
  - type: say
    content: 'New enough.'
    condition: 'version("Base.esm", "1.0.0", >=)'
  - type: warn
    content: 'Too old.'
    condition: 'version("Base.esm", "2.0.0", >=)'
"#,
    );

    let mut game = build_game(
        &data,
        vec![("Base.esm", record_with_version(true, &[], "1.2.3"))],
        &["Base.esm"],
        &["Base.esm"],
    );
    game.load_lists(Some(&master), None).unwrap();

    let visible = game.general_messages(true).unwrap();
    assert_eq!(visible.len(), 1);
    assert_eq!(visible[0].content[0].text, "New enough.");
}

#[test]
fn test_evaluated_metadata_resolves_and_clears_conditions() {
    let dir = TempDir::new().unwrap();
    let data = utf8_dir(&dir);
    fs::write(data.join("Present.esp").as_std_path(), b"x").unwrap();

    let master = write_list(
        &data,
        "masterlist.yaml",
        r#"
plugins:
  - name: Mod.esp
    after:
      - name: Kept.esp
        condition: 'file("Present.esp")'
      - name: Dropped.esp
        condition: 'file("Absent.esp")'
    msg:
      - type: say
        content: 'Shown when active.'
        condition: 'active("Base.esm")'
    tag:
      - name: Delev
        condition: 'file("Absent.esp")'
"#,
    );

    let mut game = build_game(
        &data,
        vec![
            ("Base.esm", record(true, &[])),
            ("Mod.esp", record(false, &["Base.esm"])),
        ],
        &["Base.esm", "Mod.esp"],
        &["Base.esm"],
    );
    game.load_lists(Some(&master), None).unwrap();

    let resolved = game.plugin_metadata("Mod.esp", true, true).unwrap().unwrap();
    assert_eq!(resolved.load_after.len(), 1);
    assert_eq!(resolved.load_after[0].name, "Kept.esp");
    assert!(resolved.load_after[0].condition.is_none());
    assert_eq!(resolved.messages.len(), 1);
    assert!(resolved.messages[0].condition.is_none());
    assert!(resolved.tags.is_empty());

    // Without evaluation the conditions stay attached.
    let raw = game.plugin_metadata("Mod.esp", true, false).unwrap().unwrap();
    assert_eq!(raw.load_after.len(), 2);
    assert!(raw.load_after[0].condition.is_some());
}

#[test]
fn test_dirty_info_filtered_by_plugin_crc() {
    let dir = TempDir::new().unwrap();
    let data = utf8_dir(&dir);
    let master = write_list(
        &data,
        "masterlist.yaml",
        r#"
plugins:
  - name: Mod.esp
    dirty:
      - crc: 0xAAAA5555
        util: xEdit
        itm: 1
      - crc: 0x00000001
        util: xEdit
        itm: 9
"#,
    );

    let mut dirty_record = record(false, &[]);
    dirty_record.crc = 0xAAAA_5555;
    let mut game = build_game(&data, vec![("Mod.esp", dirty_record)], &[], &[]);
    game.load_lists(Some(&master), None).unwrap();

    let resolved = game.plugin_metadata("Mod.esp", true, true).unwrap().unwrap();
    assert_eq!(resolved.dirty_info.len(), 1);
    assert_eq!(resolved.dirty_info[0].crc, 0xAAAA_5555);

    let raw = game.plugin_metadata("Mod.esp", true, false).unwrap().unwrap();
    assert_eq!(raw.dirty_info.len(), 2);
}

#[test]
fn test_condition_results_hold_within_an_epoch() {
    let dir = TempDir::new().unwrap();
    let data = utf8_dir(&dir);
    let marker = data.join("Marker.esp");
    fs::write(marker.as_std_path(), b"x").unwrap();

    let master = write_list(
        &data,
        "masterlist.yaml",
        r#"
plugins:
  - name: Mod.esp
    msg:
      - type: say
        content: 'Marker present.'
        condition: 'file("Marker.esp")'
"#,
    );

    let mut game = build_game(&data, vec![("Mod.esp", record(false, &[]))], &[], &[]);
    game.load_lists(Some(&master), None).unwrap();

    let resolved = game.plugin_metadata("Mod.esp", true, true).unwrap().unwrap();
    assert_eq!(resolved.messages.len(), 1);

    // The file disappears, but the epoch's cached result is reused.
    fs::remove_file(marker.as_std_path()).unwrap();
    let resolved = game.plugin_metadata("Mod.esp", true, true).unwrap().unwrap();
    assert_eq!(resolved.messages.len(), 1);

    // general_messages(true) starts a fresh epoch; the next metadata query
    // sees the new on-disk state.
    game.general_messages(true).unwrap();
    let resolved = game.plugin_metadata("Mod.esp", true, true).unwrap().unwrap();
    assert!(resolved.messages.is_empty());

    assert!(game.metrics().condition_cache_hits() >= 1);
    assert!(game.metrics().condition_cache_misses() >= 2);
}

#[test]
fn test_checksum_and_many_conditions_against_data_dir() {
    let dir = TempDir::new().unwrap();
    let data = utf8_dir(&dir);
    let payload = b"binary payload";
    let crc = crc32fast::hash(payload);
    fs::write(data.join("patch.bin").as_std_path(), payload).unwrap();
    fs::write(data.join("Texture1.dds").as_std_path(), b"a").unwrap();
    fs::write(data.join("Texture2.dds").as_std_path(), b"b").unwrap();

    let master = write_list(
        &data,
        "masterlist.yaml",
        &format!(
            r#"
globals:
  - type: say
    content: 'Checksum holds.'
    condition: 'checksum("patch.bin", {crc:08X})'
  - type: say
    content: 'Many textures.'
    condition: 'many("Texture\d\.dds")'
  - type: warn
    content: 'Wrong checksum.'
    condition: 'checksum("patch.bin", 00000000)'
"#
        ),
    );

    let mut game = build_game(&data, vec![], &[], &[]);
    game.load_lists(Some(&master), None).unwrap();

    let visible = game.general_messages(true).unwrap();
    let texts: Vec<&str> = visible.iter().map(|m| m.content[0].text.as_str()).collect();
    assert!(texts.contains(&"Checksum holds."));
    assert!(texts.contains(&"Many textures."));
    assert!(!texts.contains(&"Wrong checksum."));
}

#[test]
fn test_game_executable_version_condition() {
    let dir = TempDir::new().unwrap();
    let data = utf8_dir(&dir);
    let master = write_list(
        &data,
        "masterlist.yaml",
        r#"
globals:
  - type: say
    content: 'Modern runtime.'
    condition: 'version("", "1.5.0", >=)'
"#,
    );

    let inspector = common::FakeInspector::new().with_executable_version("1.5.97");
    let mut game = plugsort::Game::new(
        plugsort::GameId::SkyrimSE,
        data.clone(),
        Box::new(inspector),
        Box::new(common::FakeLoadOrder::empty()),
        Box::new(common::FakeVcs {
            fetched_content: None,
            changed: false,
        }),
    );
    game.set_executable(&data.join("SkyrimSE.exe"));
    game.load_lists(Some(&master), None).unwrap();

    let visible = game.general_messages(true).unwrap();
    assert_eq!(visible.len(), 1);
}
