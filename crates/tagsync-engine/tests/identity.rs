use tagsync_engine::{derive_identity, infer_prefix, sanitize_address, NameMode, TagEntry};

#[test]
fn sanitization_is_stable() {
    assert_eq!(derive_identity("Pump01", "N7:0"), "Pump01N7_0");
    assert_eq!(
        derive_identity("FIT", "Prog:Station01.Level.PV"),
        "FITProg_Station01_Level_PV"
    );
    assert_eq!(derive_identity("T", "a b"), "Ta_20_b");
    assert_eq!(derive_identity("T", "a : b"), "Ta_20_20_b");
}

#[test]
fn empty_parts() {
    assert_eq!(derive_identity("Pump01", ""), "Pump01");
    assert_eq!(derive_identity("", "N7:0"), "N7_0");
    assert_eq!(derive_identity("", ""), "");
    assert_eq!(sanitize_address(":[]."), "");
}

#[test]
fn derivation_is_repeatable() {
    let first = derive_identity("LT", "Tank[3].Level");
    let second = derive_identity("LT", "Tank[3].Level");
    assert_eq!(first, second);
    assert_eq!(first, "LTTank_3_Level");
}

#[test]
fn derived_entries_follow_edits() {
    let mut entry = TagEntry::single("Pump01", "N7:0");
    assert_eq!(entry.identity(), "Pump01N7_0");
    assert_eq!(entry.name_mode(), NameMode::Derived);

    entry.set_address("N7:1");
    assert_eq!(entry.identity(), "Pump01N7_1");
    entry.set_prefix("P2_");
    assert_eq!(entry.identity(), "P2_N7_1");
}

#[test]
fn manual_names_survive_edits() {
    let mut entry = TagEntry::single("Pump01", "N7:0");
    entry.rename("MainPump");
    assert_eq!(entry.name_mode(), NameMode::Manual);

    entry.set_address("N7:5");
    entry.set_prefix("X");
    assert_eq!(entry.identity(), "MainPump");
    assert_eq!(entry.address(), "N7:5");
}

#[test]
fn switching_back_to_derived_waits_for_next_edit() {
    let mut entry = TagEntry::single("Pump01", "N7:0");
    entry.rename("MainPump");
    entry.set_name_mode(NameMode::Derived);
    assert_eq!(entry.identity(), "MainPump");

    entry.set_address("N7:2");
    assert_eq!(entry.identity(), "Pump01N7_2");
}

#[test]
fn udt_instances_are_named_by_prefix() {
    let mut entry = TagEntry::udt("Pump01", "Prog:Pump01", "Motor_Basic");
    assert_eq!(entry.identity(), "Pump01");
    entry.set_address("Prog:Pump02");
    assert_eq!(entry.identity(), "Pump01");
    entry.set_prefix("Pump02");
    assert_eq!(entry.identity(), "Pump02");
}

#[test]
fn prefix_inference_is_best_effort() {
    assert_eq!(
        infer_prefix("FITProg_Station01_Level_PV", "Prog:Station01.Level.PV").as_deref(),
        Some("FIT")
    );
    assert_eq!(infer_prefix("Pump01_N7_0", "n7:0").as_deref(), Some("Pump01"));
    assert_eq!(infer_prefix("MainPump", "N7:0"), None);
    assert_eq!(infer_prefix("anything", ""), None);
}
