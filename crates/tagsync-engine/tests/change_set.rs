mod common;

use common::{names, variable, MemoryStore};
use tagsync_engine::{
    classify, classify_tables, project, ChangeSet, Partition, PartitionKind, RecordSink,
    RecordSource, Selection, SelectionKey, TableKind, TableSet,
};

fn sample_partition() -> Partition {
    let persisted = [
        variable(&[("NAME", "A"), ("FORMAT", "#.#")]),
        variable(&[("NAME", "B"), ("ADDR", "N7:1")]),
        variable(&[("NAME", "C"), ("ADDR", "N7:2")]),
    ];
    let proposed = [
        variable(&[("NAME", "A"), ("FORMAT", "#.##")]),
        variable(&[("NAME", "B"), ("ADDR", "N7:1")]),
        variable(&[("NAME", "D"), ("ADDR", "N7:3")]),
        variable(&[("NAME", "E"), ("ADDR", "N7:4")]),
    ];
    classify(TableKind::Variable, &persisted, &proposed).unwrap()
}

fn key(partition: PartitionKind, identity: &str) -> SelectionKey {
    SelectionKey::new(TableKind::Variable, partition, identity)
}

#[test]
fn everything_starts_accepted() {
    let partition = sample_partition();
    let selection = Selection::init_partition(&partition);

    assert_eq!(selection.len(), 4);
    assert!(selection.keys().all(|key| selection.is_accepted(key)));
    assert!(!selection.contains(&key(PartitionKind::Unchanged, "B")));

    let delta = project(&partition, &selection);
    assert_eq!(names(&delta.append), ["D", "E"]);
    assert_eq!(names(&delta.update), ["A"]);
    assert_eq!(names(&delta.delete), ["C"]);
    assert_eq!(delta.update[0].text("FORMAT"), "#.##");
}

#[test]
fn absent_keys_count_as_accepted() {
    let partition = sample_partition();
    let delta = project(&partition, &Selection::default());
    assert_eq!(delta.len(), 4);
}

#[test]
fn toggled_rows_are_left_out() {
    let partition = sample_partition();
    let mut selection = Selection::init_partition(&partition);

    assert!(selection.toggle(&key(PartitionKind::New, "D")));
    assert!(selection.toggle(&key(PartitionKind::Orphaned, "C")));
    let delta = project(&partition, &selection);

    assert_eq!(names(&delta.append), ["E"]);
    assert!(delta.delete.is_empty());
    let rejected: Vec<String> = selection.rejected().map(ToString::to_string).collect();
    assert_eq!(rejected, ["variable·new·D", "variable·orphaned·C"]);

    assert!(selection.toggle(&key(PartitionKind::New, "D")));
    assert_eq!(names(&project(&partition, &selection).append), ["D", "E"]);
}

#[test]
fn unknown_keys_are_ignored() {
    let partition = sample_partition();
    let mut selection = Selection::init_partition(&partition);
    let before = selection.clone();

    assert!(!selection.toggle(&key(PartitionKind::New, "Nope")));
    assert!(!selection.set(&key(PartitionKind::Unchanged, "B"), false));
    assert!(!selection.toggle(&SelectionKey::new(TableKind::Trend, PartitionKind::New, "D")));
    assert_eq!(selection, before);
}

#[test]
fn bulk_set_touches_one_partition() {
    let partition = sample_partition();
    let mut selection = Selection::init_partition(&partition);

    assert_eq!(selection.bulk_set(TableKind::Variable, PartitionKind::New, false), 2);
    let delta = project(&partition, &selection);
    assert!(delta.append.is_empty());
    assert_eq!(names(&delta.update), ["A"]);
    assert_eq!(names(&delta.delete), ["C"]);

    assert_eq!(selection.bulk_set(TableKind::Trend, PartitionKind::New, false), 0);
}

#[test]
fn unchanged_rows_never_reach_the_delta() {
    let partition = sample_partition();
    let delta = project(&partition, &Selection::init_partition(&partition));
    let touched: Vec<String> = [&delta.append, &delta.update, &delta.delete]
        .into_iter()
        .flat_map(|rows| names(rows))
        .collect();
    assert!(!touched.contains(&"B".to_string()));
}

#[test]
fn keys_parse_back() {
    let parsed = SelectionKey::parse("variable/modified/Pump01.Run").unwrap();
    assert_eq!(parsed, key(PartitionKind::Modified, "Pump01.Run"));
    assert_eq!(parsed.to_string(), "variable·modified·Pump01.Run");
    assert_eq!(SelectionKey::parse(&parsed.to_string()).unwrap(), parsed);

    let alarm = SelectionKey::parse("digalm/orphaned/a/b").unwrap();
    assert_eq!(alarm.table, TableKind::Alarm);
    assert_eq!(alarm.identity, "a/b");

    assert!(SelectionKey::parse("variable/new").is_err());
    assert!(SelectionKey::parse("pens/new/X").is_err());
}

#[test]
fn reviewed_write_back_commits_to_the_store() {
    let persisted = TableSet {
        variable: vec![
            variable(&[("NAME", "A"), ("FORMAT", "#.#"), ("GUID", "guid-a")]),
            variable(&[("NAME", "C"), ("GUID", "guid-c")]),
        ],
        ..TableSet::default()
    };
    let proposed = TableSet {
        variable: vec![
            variable(&[("NAME", "A"), ("FORMAT", "#.##")]),
            variable(&[("NAME", "D")]),
        ],
        ..TableSet::default()
    };
    let mut store = MemoryStore::new(persisted);
    let current = store.load_all().unwrap();

    let mut review = ChangeSet::new(classify_tables(&current, &proposed).unwrap());
    review.set(
        &SelectionKey::new(TableKind::Variable, PartitionKind::Orphaned, "C"),
        false,
    );
    let write_back = review.project();
    assert!(write_back.trend.is_empty() && write_back.alarm.is_empty());

    let summary = store.commit_all(&write_back).unwrap();
    assert_eq!((summary.appended, summary.updated, summary.deleted), (1, 1, 0));

    let rows = store.load(TableKind::Variable).unwrap();
    assert_eq!(names(&rows), ["A", "C", "D"]);
    assert_eq!(rows[0].text("FORMAT"), "#.##");
    assert_eq!(rows[0].text("GUID"), "guid-a");
    assert_eq!(rows[2].text("GUID"), "guid-1");

    let after = classify_tables(&store.load_all().unwrap(), &proposed).unwrap();
    assert_eq!(names(&after.variable.orphaned), ["C"]);
    assert!(after.variable.new.is_empty() && after.variable.modified.is_empty());
}
