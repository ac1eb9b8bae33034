//! Integration tests for the database facade: list loading, merge
//! semantics, user metadata mutation, minimal list output, and masterlist
//! updates through the VCS client.

mod common;

use common::{build_game, record, utf8_dir, write_list, FakeInspector, FakeLoadOrder, FakeVcs};
use plugsort::{Error, Game, GameId, MetadataList, PluginMetadata, Priority};
use tempfile::TempDir;

const MASTERLIST: &str = r#"
bash_tags: [Delev, Relev]
globals:
  - type: say
    content: 'Masterlist note.'
plugins:
  - name: Mod.esp
    group: Late
    priority: 1
    after: [Base.esm]
    tag: [Delev]
    dirty:
      - crc: 0x12345678
        util: xEdit
        itm: 3
groups:
  - name: Early
  - name: Late
    after: [Early]
"#;

const USERLIST: &str = r#"
bash_tags: [C.Water]
globals:
  - type: warn
    content: 'Userlist note.'
plugins:
  - name: Mod.esp
    priority: 6
    tag: [Relev]
"#;

fn game_with_lists(dir: &TempDir) -> Game {
    let data = utf8_dir(dir);
    let master = write_list(&data, "masterlist.yaml", MASTERLIST);
    let user = write_list(&data, "userlist.yaml", USERLIST);
    let mut game = build_game(
        &data,
        vec![
            ("Base.esm", record(true, &[])),
            ("Mod.esp", record(false, &["Base.esm"])),
        ],
        &["Base.esm", "Mod.esp"],
        &["Base.esm", "Mod.esp"],
    );
    game.load_lists(Some(&master), Some(&user)).unwrap();
    game
}

#[test]
fn test_merged_metadata_userlist_scalars_win() {
    let dir = TempDir::new().unwrap();
    let mut game = game_with_lists(&dir);

    let merged = game.plugin_metadata("Mod.esp", true, false).unwrap().unwrap();
    assert_eq!(merged.priority.value(), 6);
    assert_eq!(merged.group.as_deref(), Some("Late"));
    assert_eq!(merged.tags.len(), 2);

    let master_only = game.plugin_metadata("Mod.esp", false, false).unwrap().unwrap();
    assert_eq!(master_only.priority.value(), 1);
    assert_eq!(master_only.tags.len(), 1);
}

#[test]
fn test_unknown_plugin_has_no_metadata() {
    let dir = TempDir::new().unwrap();
    let mut game = game_with_lists(&dir);
    assert!(game.plugin_metadata("Ghost.esp", true, false).unwrap().is_none());
}

#[test]
fn test_known_bash_tags_are_a_union() {
    let dir = TempDir::new().unwrap();
    let game = game_with_lists(&dir);
    assert_eq!(game.known_bash_tags(), vec!["Delev", "Relev", "C.Water"]);
}

#[test]
fn test_general_messages_concatenate_masterlist_first() {
    let dir = TempDir::new().unwrap();
    let mut game = game_with_lists(&dir);

    let messages = game.general_messages(false).unwrap();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0].content[0].text, "Masterlist note.");
    assert_eq!(messages[1].content[0].text, "Userlist note.");
}

#[test]
fn test_set_then_discard_user_metadata() {
    let dir = TempDir::new().unwrap();
    let mut game = game_with_lists(&dir);

    let mut replacement = PluginMetadata::new("Mod.esp");
    replacement.priority = Priority::user(9);
    game.set_plugin_user_metadata(replacement);

    // Replaced, not merged: the userlist tag is gone.
    let user = game.plugin_user_metadata("Mod.esp", false).unwrap().unwrap();
    assert!(user.tags.is_empty());
    assert_eq!(user.priority.value(), 9);

    game.discard_plugin_user_metadata("Mod.esp");
    assert!(game.plugin_user_metadata("Mod.esp", false).unwrap().is_none());

    // Masterlist data is untouched by userlist discards.
    let merged = game.plugin_metadata("Mod.esp", true, false).unwrap().unwrap();
    assert_eq!(merged.priority.value(), 1);

    game.discard_all_user_metadata();
    assert_eq!(game.known_bash_tags(), vec!["Delev", "Relev"]);
}

#[test]
fn test_write_user_metadata_round_trip() {
    let dir = TempDir::new().unwrap();
    let data = utf8_dir(&dir);
    let game = game_with_lists(&dir);

    let out = data.join("saved_userlist.yaml");
    game.write_user_metadata(&out, false).unwrap();

    let reloaded = MetadataList::load(&out).unwrap();
    let entry = reloaded.find_plugin("Mod.esp").unwrap();
    assert_eq!(entry.priority.value(), 6);
    assert_eq!(entry.tags.len(), 1);

    // Refuses to clobber without overwrite.
    let err = game.write_user_metadata(&out, false).unwrap_err();
    assert!(matches!(err, Error::FileAccess(_)));
    game.write_user_metadata(&out, true).unwrap();
}

#[test]
fn test_minimal_list_round_trip_keeps_only_tags_and_dirty_info() {
    let dir = TempDir::new().unwrap();
    let data = utf8_dir(&dir);
    let game = game_with_lists(&dir);

    let out = data.join("taglist.yaml");
    game.write_minimal_list(&out, false).unwrap();

    let minimal = MetadataList::load(&out).unwrap();
    let entry = minimal.find_plugin("Mod.esp").unwrap();
    assert_eq!(entry.tags.len(), 1);
    assert_eq!(entry.tags[0].name, "Delev");
    assert_eq!(entry.dirty_info.len(), 1);
    assert_eq!(entry.dirty_info[0].crc, 0x1234_5678);
    assert_eq!(entry.dirty_info[0].itm, 3);
    // Nothing else survives.
    assert!(entry.group.is_none());
    assert!(entry.priority.is_unset());
    assert!(entry.load_after.is_empty());
    assert!(entry.messages.is_empty());
    assert!(entry.locations.is_empty());
}

#[test]
fn test_load_lists_missing_files_error() {
    let dir = TempDir::new().unwrap();
    let data = utf8_dir(&dir);
    let mut game = build_game(&data, vec![], &[], &[]);

    let missing = data.join("not_there.yaml");
    let err = game.load_lists(Some(&missing), None).unwrap_err();
    assert!(matches!(err, Error::FileAccess(_)));
    assert_eq!(err.code(), 1);
}

#[test]
fn test_update_masterlist_swaps_on_change() {
    let dir = TempDir::new().unwrap();
    let data = utf8_dir(&dir);
    let path = data.join("masterlist.yaml");

    let mut game = Game::new(
        GameId::SkyrimSE,
        data.clone(),
        Box::new(FakeInspector::new()),
        Box::new(FakeLoadOrder::empty()),
        Box::new(FakeVcs {
            fetched_content: Some("plugins:\n  - name: Fetched.esp\n    group: Late\n".into()),
            changed: true,
        }),
    );

    let changed = game
        .update_masterlist(&path, "https://example.com/repo.git", "v0.13")
        .unwrap();
    assert!(changed);
    assert!(game
        .database()
        .masterlist()
        .list()
        .find_plugin("Fetched.esp")
        .is_some());
    assert_eq!(game.database().masterlist().revision_id(), Some("f0e1d2c"));

    let info = game.masterlist_revision(&path, true).unwrap();
    assert_eq!(info.revision_id, "f0e1d2c");
    assert!(!game.is_latest_masterlist(&path, "v0.13").unwrap());
}

#[test]
fn test_update_masterlist_without_change_keeps_current() {
    let dir = TempDir::new().unwrap();
    let data = utf8_dir(&dir);
    let path = write_list(&data, "masterlist.yaml", "plugins:\n  - name: Old.esp\n    group: G\n");

    let mut game = Game::new(
        GameId::SkyrimSE,
        data.clone(),
        Box::new(FakeInspector::new()),
        Box::new(FakeLoadOrder::empty()),
        Box::new(FakeVcs {
            fetched_content: None,
            changed: false,
        }),
    );
    game.load_lists(Some(&path), None).unwrap();

    let changed = game
        .update_masterlist(&path, "https://example.com/repo.git", "v0.13")
        .unwrap();
    assert!(!changed);
    assert!(game
        .database()
        .masterlist()
        .list()
        .find_plugin("Old.esp")
        .is_some());
    assert!(game.is_latest_masterlist(&path, "v0.13").unwrap());
}

#[test]
fn test_plugin_views_load_on_demand() {
    let dir = TempDir::new().unwrap();
    let data = utf8_dir(&dir);
    let inspector = FakeInspector::new().with_plugin("Lazy.esp", record(false, &["Base.esm"]));
    let mut game = Game::new(
        GameId::SkyrimSE,
        data,
        Box::new(inspector),
        Box::new(FakeLoadOrder::empty()),
        Box::new(FakeVcs {
            fetched_content: None,
            changed: false,
        }),
    );

    assert_eq!(game.cache().plugin_count(), 0);
    let view = game.plugin("Lazy.esp").unwrap();
    assert!(view.has_master("Base.esm"));
    assert_eq!(game.cache().plugin_count(), 1);

    let err = game.plugin("Unknown.esp").unwrap_err();
    assert!(matches!(err, Error::FileAccess(_)));

    game.clear_cache();
    assert_eq!(game.cache().plugin_count(), 0);
}

#[test]
fn test_malformed_document_fails_loudly() {
    let dir = TempDir::new().unwrap();
    let data = utf8_dir(&dir);
    let bad = write_list(
        &data,
        "masterlist.yaml",
        "plugins:\n  - name: Mod.esp\n    after:\n      - name: Other.esp\n        condition: '???'\n",
    );

    let mut game = build_game(&data, vec![], &[], &[]);
    let err = game.load_lists(Some(&bad), None).unwrap_err();
    assert!(matches!(err, Error::ConditionSyntax { .. }));
    assert_eq!(err.code(), 2);
}
