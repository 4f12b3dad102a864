use showscout_core::QualityTier;
use showscout_scanner::scan_dir;
use std::fs;
use std::path::PathBuf;

fn fixture_root(name: &str) -> PathBuf {
    let root = std::env::temp_dir().join(format!("showscout_{name}_{}", std::process::id()));
    let _ = fs::remove_dir_all(&root);
    fs::create_dir_all(&root).unwrap();
    root
}

fn touch(root: &PathBuf, rel: &str) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, b"").unwrap();
}

#[test]
fn scans_episode_tree() {
    let root = fixture_root("tree");
    touch(&root, "Lost/Season 01/Lost.S01E01.Pilot.720p.HDTV.x264.mkv");
    touch(&root, "Lost/Season 01/Lost.S01E02E03.HDTV.XviD.avi");
    touch(&root, "Lost/Season 01/Lost.S01E01.nfo");
    touch(&root, "Lost/@eaDir/Lost.S01E04.mkv");
    touch(&root, "Lost/.hidden/Lost.S01E05.mkv");
    touch(&root, "Fringe/S02E03.mkv");
    touch(&root, "misc/holiday.mp4");

    let known = vec!["Lost".to_string()];
    let files = scan_dir(&root, &known);

    let names: Vec<&str> = files.iter().map(|f| f.name.as_str()).collect();
    assert_eq!(
        names,
        vec![
            "S02E03.mkv",
            "Lost.S01E01.Pilot.720p.HDTV.x264.mkv",
            "Lost.S01E02E03.HDTV.XviD.avi",
        ]
    );

    assert_eq!(files[0].show.as_deref(), Some("Fringe"));
    assert_eq!(files[1].quality, QualityTier::Hdtv720p);
    assert_eq!(files[1].title.as_deref(), Some("Pilot"));
    assert_eq!(files[2].second_episode, Some(3));
    assert_eq!(files[2].quality, QualityTier::HdtvXvid);

    let _ = fs::remove_dir_all(&root);
}

#[test]
fn missing_root_yields_nothing() {
    let root = std::env::temp_dir().join(format!("showscout_missing_{}", std::process::id()));
    assert!(scan_dir(&root, &[]).is_empty());
}
