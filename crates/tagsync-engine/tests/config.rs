use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use tagsync_engine::{
    expand_all, DefaultField, ProjectConfig, SyncError, TagEntry, TemplateStore,
};

fn unique_temp_dir(prefix: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock")
        .as_nanos();
    let dir = std::env::temp_dir().join(format!("{prefix}-{}-{nanos}", std::process::id()));
    std::fs::create_dir_all(&dir).expect("create temp dir");
    dir
}

#[test]
fn full_config_is_applied() {
    let config = ProjectConfig::parse(
        r#"
[project]
name = "Water Treatment"
log_level = "DEBUG"

[defaults]
cluster = "Plant"
io_device = "PLC_A"
sample_period = "00:00:02"
alarm_category = "5"

[[template]]
name = "Dosing_Pump"
description = "Chemical dosing pump"

[[template.member]]
suffix = ".Run"
address_offset = ".Running"
is_trend = true

[[template.member]]
suffix = ".Stroke"
address_offset = ".StrokePct"
data_type = "REAL"
comment_template = "{parent_desc} stroke"
is_alarm = true
defaults = { alarm_category = "9" }
"#,
    )
    .unwrap();

    assert_eq!(config.name, "Water Treatment");
    assert_eq!(config.log_level, "debug");
    assert_eq!(config.settings.cluster, "Plant");
    assert_eq!(config.settings.io_device, "PLC_A");
    assert_eq!(
        config.settings.defaults.get(DefaultField::SamplePeriod).map(|v| v.as_str()),
        Some("00:00:02")
    );
    assert_eq!(
        config.templates.names(),
        ["Motor_Basic", "Valve_Basic", "Dosing_Pump"]
    );

    let tags = [TagEntry::udt("DP1", "Prog:DP1", "Dosing_Pump").with_description("Chlorine")];
    let expansion = expand_all(&tags, &config.templates, &config.settings).unwrap();
    let stroke = &expansion.tables.variable[1];
    assert_eq!(stroke.text("NAME"), "DP1.Stroke");
    assert_eq!(stroke.text("ADDR"), "Prog:DP1.StrokePct");
    assert_eq!(stroke.text("TYPE"), "REAL");
    assert_eq!(stroke.text("CLUSTER"), "Plant");
    assert_eq!(stroke.text("COMMENT"), "Chlorine stroke");
    assert_eq!(expansion.tables.variable[0].text("TYPE"), "DIGITAL");
    assert_eq!(expansion.tables.trend[0].text("SAMPLEPER"), "00:00:02");
    assert_eq!(expansion.tables.alarm[0].text("CATEGORY"), "9");
}

#[test]
fn empty_config_uses_defaults() {
    let config = ProjectConfig::parse("").unwrap();
    assert_eq!(config.log_level, "info");
    assert_eq!(config.settings.cluster, "Cluster1");
    assert_eq!(config.settings.io_device, "IO_DEV_1");
    assert_eq!(config.templates.names(), ["Motor_Basic", "Valve_Basic"]);
}

#[test]
fn missing_file_in_project_uses_defaults() {
    let root = unique_temp_dir("tagsync-config-missing");
    let config = ProjectConfig::load_project(&root).unwrap();
    assert_eq!(config.name, "project");
    std::fs::remove_dir_all(root).ok();
}

#[test]
fn project_file_is_read() {
    let root = unique_temp_dir("tagsync-config-file");
    std::fs::write(
        root.join("tagsync.toml"),
        "[project]\nname = \"Line 3\"\n[defaults]\ncluster = \"L3\"\n",
    )
    .unwrap();
    let config = ProjectConfig::load_project(&root).unwrap();
    assert_eq!(config.name, "Line 3");
    assert_eq!(config.settings.cluster, "L3");
    std::fs::remove_dir_all(root).ok();
}

#[test]
fn missing_project_folder_is_an_error() {
    let root = std::env::temp_dir().join("tagsync-config-does-not-exist-7f3a");
    assert!(matches!(
        ProjectConfig::load_project(&root),
        Err(SyncError::InvalidConfig(_))
    ));
}

#[test]
fn invalid_values_are_rejected() {
    let cases = [
        "[project]\nlog_level = \"loud\"\n",
        "[defaults]\ncluster = \"  \"\n",
        "[defaults]\nunknown_key = \"x\"\n",
        "[[template]]\nname = \"T\"\n[[template]]\nname = \"T\"\n",
    ];
    for text in cases {
        assert!(
            matches!(ProjectConfig::parse(text), Err(SyncError::InvalidConfig(_))),
            "{text}"
        );
    }
}

#[test]
fn duplicate_member_suffix_is_an_invalid_template() {
    let text = r#"
[[template]]
name = "T"
[[template.member]]
suffix = ".A"
[[template.member]]
suffix = ".A"
"#;
    assert!(matches!(
        ProjectConfig::parse(text),
        Err(SyncError::InvalidTemplate { .. })
    ));
}

#[test]
fn overriding_a_builtin_bumps_its_version() {
    let text = r#"
[[template]]
name = "Valve_Basic"
description = "Valve with limit switches"
[[template.member]]
suffix = ".Open"
"#;
    let config = ProjectConfig::parse(text).unwrap();
    let valve = config.templates.get("Valve_Basic").unwrap();
    assert_eq!(valve.version, 2);
    assert_eq!(valve.members.len(), 1);
}
