use anyhow::Result;
use frame_review::draw::model::{PathData, Point, Stroke, StrokeStyle};
use frame_review::store::StorageKeys;
use frame_review::{Anchor, AnnotationStore, CommentKind, FileStore, KvStore, MemoryStore};

fn stroke(id: &str) -> Stroke {
    Stroke::new(id, PathData::new(Point::new(2.0, 3.0)), StrokeStyle::default())
}

/// Data in the layout earlier builds of the review screen wrote.
const SAVED_COMMENTS: &str = r#"[
  {"id":"1700000000001","timestamp":4,"text":"too dark","displayTime":"00:04","replies":[
    {"id":"1700000000005","parentId":"1700000000001","timestamp":6,"text":"agreed","displayTime":"00:06"}
  ]},
  {"id":"1700000000002","timestamp":9,"text":"pin","displayTime":"00:09","replies":[],
   "isAnchor":true,"anchorX":0.25,"anchorY":0.5}
]"#;

const SAVED_DRAWINGS: &str = r##"{
  "4":[{"id":"1700000000003","data":"M10,10 L20,20 L30,25","color":"#EF4444","strokeWidth":3}],
  "11":[{"id":"1700000000004","data":"M1,1","color":"#22C55E","strokeWidth":4}]
}"##;

#[test]
fn reads_previously_saved_layout() {
    let kv = MemoryStore::new()
        .with_slot("comments_v3", SAVED_COMMENTS)
        .with_slot("drawings_v3", SAVED_DRAWINGS);
    let store = AnnotationStore::open(kv, 3);

    assert_eq!(store.comments().len(), 2);
    assert_eq!(store.comments()[0].replies.len(), 1);
    assert_eq!(
        store.comments()[1].kind,
        CommentKind::Anchor(Anchor::new(0.25, 0.5).expect("anchor"))
    );
    assert_eq!(store.strokes_at("4")[0].data.point_count(), 3);
    assert_eq!(store.strokes_at("11")[0].stroke_width, 4.0);
}

#[test]
fn schema_version_selects_slots() {
    let kv = MemoryStore::new().with_slot("comments_v2", SAVED_COMMENTS);
    let store = AnnotationStore::open(kv.clone(), 3);
    assert!(store.comments().is_empty());

    let store = AnnotationStore::open(kv, 2);
    assert_eq!(store.comments().len(), 2);
    assert_eq!(store.keys(), &StorageKeys::for_version(2));
}

#[test]
fn unsorted_slot_is_sorted_stably_on_load() {
    let raw = r#"[
      {"id":"a","timestamp":9,"text":"a","displayTime":"00:09"},
      {"id":"b","timestamp":2,"text":"b","displayTime":"00:02"},
      {"id":"c","timestamp":9,"text":"c","displayTime":"00:09"}
    ]"#;
    let store = AnnotationStore::open(MemoryStore::new().with_slot("comments_v3", raw), 3);
    let ids: Vec<&str> = store.comments().iter().map(|c| c.id.as_str()).collect();
    assert_eq!(ids, vec!["b", "a", "c"]);
}

#[test]
fn stored_placeholders_are_dropped_on_load() {
    let raw = r#"[
      {"id":"draw-3","timestamp":3,"text":"[Drawing feedback]","displayTime":"00:03","isDrawing":true},
      {"id":"1","timestamp":4,"text":"real","displayTime":"00:04"}
    ]"#;
    let store = AnnotationStore::open(MemoryStore::new().with_slot("comments_v3", raw), 3);
    assert_eq!(store.comments().len(), 1);
    assert_eq!(store.comments()[0].id, "1");
}

#[test]
fn corrupt_file_degrades_to_empty_and_is_kept_aside() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let mut kv = FileStore::new(dir.path());
    kv.set("comments_v3", "[{\"id\": 1")?;
    kv.set("drawings_v3", SAVED_DRAWINGS)?;

    let mut store = AnnotationStore::open(kv, 3);
    assert!(store.comments().is_empty());
    assert_eq!(store.strokes().len(), 2);
    assert!(dir.path().join("comments_v3.corrupt").exists());

    store.add_comment("fresh start", 1.0)?;
    let reopened = AnnotationStore::open(FileStore::new(dir.path()), 3);
    assert_eq!(reopened.comments().len(), 1);
    assert_eq!(
        std::fs::read_to_string(dir.path().join("comments_v3.corrupt"))?,
        "[{\"id\": 1"
    );
    Ok(())
}

#[test]
fn failed_writes_surface_and_leave_state_alone() -> Result<()> {
    let mut store = AnnotationStore::open(MemoryStore::new(), 3);
    let kept = store.add_comment("kept", 1.0)?.expect("comment");
    store.add_stroke(2.0, stroke("s1"))?;
    let comments_before = store.kv().raw("comments_v3").map(str::to_string);
    let strokes_before = store.kv().raw("drawings_v3").map(str::to_string);

    store.kv_mut().set_fail_writes(true);
    assert!(store.add_comment("lost", 3.0).is_err());
    assert!(store.add_reply(&kept.id, "lost", 3.0).is_err());
    assert!(store.delete_annotation(&kept.id).is_err());
    assert!(store.delete_annotation("draw-2").is_err());
    assert!(store.clear_bucket("2").is_err());

    assert_eq!(store.comments().len(), 1);
    assert!(store.comments()[0].replies.is_empty());
    assert_eq!(store.strokes_at("2").len(), 1);
    assert_eq!(store.kv().raw("comments_v3").map(str::to_string), comments_before);
    assert_eq!(store.kv().raw("drawings_v3").map(str::to_string), strokes_before);

    store.kv_mut().set_fail_writes(false);
    assert!(store.delete_annotation(&kept.id)?);
    assert!(store.comments().is_empty());
    Ok(())
}

#[test]
fn unknown_ids_do_not_write() -> Result<()> {
    let mut store = AnnotationStore::open(MemoryStore::new(), 3);
    store.kv_mut().set_fail_writes(true);
    assert!(!store.delete_annotation("draw-44")?);
    assert!(!store.delete_annotation("12345")?);
    assert!(!store.clear_bucket("1")?);
    Ok(())
}

#[test]
fn inserts_keep_collection_sorted() -> Result<()> {
    let mut store = AnnotationStore::open(MemoryStore::new(), 3);
    // fixed LCG so the sequence is reproducible
    let mut seed: u64 = 0x2545_F491_4F6C_DD1D;
    let mut inserted = Vec::new();
    for i in 0..60 {
        seed = seed.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
        let t = ((seed >> 33) % 20) as f64 + 0.5;
        let c = store.add_comment(&format!("c{i}"), t)?.expect("comment");
        inserted.push(c.id);
    }

    let stored = store.comments();
    assert!(stored.windows(2).all(|w| w[0].timestamp <= w[1].timestamp));
    for w in stored.windows(2) {
        if w[0].timestamp == w[1].timestamp {
            let a = inserted.iter().position(|id| *id == w[0].id);
            let b = inserted.iter().position(|id| *id == w[1].id);
            assert!(a < b, "same-second comments reordered");
        }
    }

    let reopened = AnnotationStore::open(store.kv().clone(), 3);
    assert_eq!(reopened.comments(), store.comments());
    Ok(())
}

#[test]
fn largest_possible_stored_id_does_not_block_new_annotations() -> Result<()> {
    let raw = r#"[{"id":"9223372036854775807","timestamp":1,"text":"x","displayTime":"00:01"}]"#;
    let mut store = AnnotationStore::open(MemoryStore::new().with_slot("comments_v3", raw), 3);

    let comment = store.add_comment("y", 1.0)?.expect("comment");
    let reply = store.add_reply(&comment.id, "z", 2.0)?.expect("reply");
    assert_ne!(comment.id, "9223372036854775807");
    assert_ne!(reply.id, comment.id);
    assert_eq!(store.comments().len(), 2);
    Ok(())
}

#[test]
fn padded_bucket_keys_are_folded_into_their_second() {
    let raw = r##"{
      "012":[{"id":"1","data":"M1,1","color":"#EF4444","strokeWidth":3}],
      "12":[{"id":"2","data":"M2,2","color":"#EF4444","strokeWidth":3}]
    }"##;
    let store = AnnotationStore::open(MemoryStore::new().with_slot("drawings_v3", raw), 3);
    let ids: Vec<&str> = store.strokes_at("12").iter().map(|s| s.id.as_str()).collect();
    assert_eq!(ids, vec!["1", "2"]);
    assert!(!store.strokes().contains_key("012"));
}
