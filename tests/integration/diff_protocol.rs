//! Integration tests for the diff protocol through `GameConfService`

use crate::integration::test_utils::{diff_fields, fields, ContentTree};
use gameconf_server::api::DiffResponse;
use gameconf_server::error::RequestError;
use gameconf_server::mount::hasher::compute_content_hash;

fn changed(response: DiffResponse) -> gameconf_server::diff::ChangeSet {
    match response {
        DiffResponse::Changed(changes) => changes,
        DiffResponse::Errors(error) => panic!("unexpected error response: {}", error),
    }
}

#[test]
fn test_stale_hash_reports_server_copy() {
    let tree = ContentTree::new();
    tree.write("thirdparty", "foo/bar.txt", "server copy");
    let service = tree.service(&[("thirdparty", None)]);

    let response =
        service.diff(&diff_fields("1.10.0", &[("gamedata/foo/bar.txt", "deadbeef")]));
    let expected = compute_content_hash(b"server copy");

    assert_eq!(
        response.to_body(),
        format!(
            "\"Changed\"\n{{\n\t\"foo/bar.txt\"\n\t{{\n\t\t\"md5sum\" \"{}\"\n\t\t\"location\" \"thirdparty/foo/bar.txt\"\n\t}}\n}}\n",
            expected
        )
    );
}

#[test]
fn test_matching_hash_yields_empty_change_set() {
    let tree = ContentTree::new();
    tree.write("thirdparty", "foo/bar.txt", "server copy");
    let service = tree.service(&[("thirdparty", None)]);
    let hash = compute_content_hash(b"server copy");

    let response = service.diff(&diff_fields("1.10.0", &[("gamedata/foo/bar.txt", &hash)]));
    assert_eq!(response.to_body(), "\"Changed\"\n{\n}\n");
}

#[test]
fn test_missing_or_invalid_file_count_is_malformed() {
    let tree = ContentTree::new();
    let service = tree.service(&[("thirdparty", None)]);
    let malformed = DiffResponse::Errors(RequestError::Malformed);

    assert_eq!(service.diff(&fields(&[("version", "1.10.0")])), malformed);
    assert_eq!(
        service.diff(&fields(&[("version", "1.10.0"), ("files", "two")])),
        malformed
    );
    assert_eq!(
        service.diff(&fields(&[("version", "1.10.0"), ("files", "-1")])),
        malformed
    );
    assert_eq!(
        service.diff(&fields(&[("version", "1.10.0"), ("files", "-1")])).to_body(),
        "\"Errors\"\n{\n\t\"error\" \"Failed to parse request.\"\n}\n"
    );
}

#[test]
fn test_zero_files_is_an_empty_change_set() {
    let tree = ContentTree::new();
    let service = tree.service(&[("thirdparty", None)]);
    let changes = changed(service.diff(&fields(&[("version", "1.10.0"), ("files", "0")])));
    assert!(changes.is_empty());
}

#[test]
fn test_first_eligible_mount_wins() {
    let tree = ContentTree::new();
    tree.write("first", "core.games.txt", "first");
    tree.write("second", "core.games.txt", "second");
    let service = tree.service(&[("first", None), ("second", None)]);

    let changes = changed(service.diff(&diff_fields(
        "1.10.0",
        &[("gamedata/core.games.txt", "stale")],
    )));
    let entry = &changes["core.games.txt"];
    assert_eq!(entry.hash, compute_content_hash(b"first"));
    assert_eq!(entry.location, "first/core.games.txt");

    // Submitting the first mount's hash is up to date even though the second differs.
    let first = compute_content_hash(b"first");
    let changes = changed(service.diff(&diff_fields(
        "1.10.0",
        &[("gamedata/core.games.txt", &first)],
    )));
    assert!(changes.is_empty());
}

#[test]
fn test_versioned_mounts_gate_by_prefix() {
    let tree = ContentTree::new();
    tree.write("1.10", "core.games.txt", "for 1.10");
    tree.write("1.11", "core.games.txt", "for 1.11");
    tree.write("thirdparty", "core.games.txt", "fallback");
    let service = tree.service(&[
        ("1.10", Some("1.10")),
        ("1.11", Some("1.11")),
        ("thirdparty", None),
    ]);

    let hash_for = |version: &str| {
        changed(service.diff(&diff_fields(
            version,
            &[("gamedata/core.games.txt", "stale")],
        )))["core.games.txt"]
            .hash
            .clone()
    };

    assert_eq!(hash_for("1.10.3"), compute_content_hash(b"for 1.10"));
    assert_eq!(hash_for("1.10"), compute_content_hash(b"for 1.10"));
    assert_eq!(hash_for("1.11.0.6500"), compute_content_hash(b"for 1.11"));
    assert_eq!(hash_for("1.9"), compute_content_hash(b"fallback"));
    assert_eq!(hash_for("1"), compute_content_hash(b"fallback"));
    assert_eq!(hash_for("not-a-version"), compute_content_hash(b"fallback"));
}

#[test]
fn test_files_absent_everywhere_are_omitted() {
    let tree = ContentTree::new();
    tree.write("thirdparty", "present.txt", "here");
    let service = tree.service(&[("thirdparty", None)]);

    let changes = changed(service.diff(&diff_fields(
        "1.10.0",
        &[
            ("gamedata/missing.txt", "stale"),
            ("gamedata/present.txt", "stale"),
        ],
    )));
    assert_eq!(changes.keys().collect::<Vec<_>>(), vec!["present.txt"]);
}

#[test]
fn test_paths_outside_prefix_and_empty_hashes_are_skipped() {
    let tree = ContentTree::new();
    tree.write("thirdparty", "core.games.txt", "server");
    tree.write("thirdparty", "plugins/x.txt", "server");
    let service = tree.service(&[("thirdparty", None)]);

    let changes = changed(service.diff(&diff_fields(
        "1.10.0",
        &[
            ("plugins/x.txt", "stale"),
            ("gamedata/core.games.txt", ""),
            ("gamedata/../secret.txt", "stale"),
        ],
    )));
    assert!(changes.is_empty());
}

#[test]
fn test_missing_index_fields_are_skipped() {
    let tree = ContentTree::new();
    tree.write("thirdparty", "a.txt", "a");
    tree.write("thirdparty", "b.txt", "b");
    let service = tree.service(&[("thirdparty", None)]);

    let changes = changed(service.diff(&fields(&[
        ("version", "1.10.0"),
        ("files", "3"),
        ("file_0_name", "gamedata/a.txt"),
        ("file_1_md5", "stale"),
        ("file_2_name", "gamedata/b.txt"),
        ("file_2_md5", "stale"),
        ("file_3_name", "gamedata/a.txt"),
        ("file_3_md5", "beyond the declared count"),
    ])));
    assert_eq!(changes.keys().collect::<Vec<_>>(), vec!["b.txt"]);
}

#[test]
fn test_change_set_preserves_submission_order() {
    let tree = ContentTree::new();
    for name in ["c.txt", "a.txt", "b.txt"] {
        tree.write("thirdparty", name, name);
    }
    let service = tree.service(&[("thirdparty", None)]);

    let changes = changed(service.diff(&diff_fields(
        "1.10.0",
        &[
            ("gamedata/c.txt", "x"),
            ("gamedata/a.txt", "x"),
            ("gamedata/b.txt", "x"),
        ],
    )));
    assert_eq!(
        changes.keys().collect::<Vec<_>>(),
        vec!["c.txt", "a.txt", "b.txt"]
    );
}

#[test]
fn test_backslash_paths_map_to_posix_locations() {
    let tree = ContentTree::new();
    tree.write("thirdparty", "sdktools.games/game.tf.txt", "tf");
    let service = tree.service(&[("thirdparty", None)]);

    let changes = changed(service.diff(&diff_fields(
        "1.10.0",
        &[("gamedata/sdktools.games\\game.tf.txt", "stale")],
    )));
    let entry = &changes["sdktools.games/game.tf.txt"];
    assert_eq!(entry.location, "thirdparty/sdktools.games/game.tf.txt");
}

#[test]
fn test_locations_are_percent_encoded() {
    let tree = ContentTree::new();
    tree.write("thirdparty", "custom/my file#1.txt", "x");
    let service = tree.service(&[("thirdparty", None)]);

    let changes = changed(service.diff(&diff_fields(
        "1.10.0",
        &[("gamedata/custom/my file#1.txt", "stale")],
    )));
    assert_eq!(
        changes["custom/my file#1.txt"].location,
        "thirdparty/custom/my%20file%231.txt"
    );
}

#[test]
fn test_diff_is_idempotent_and_tracks_changes() {
    let tree = ContentTree::new();
    tree.write("thirdparty", "core.games.txt", "v1");
    let service = tree.service(&[("thirdparty", None)]);
    let request = diff_fields("1.10.0", &[("gamedata/core.games.txt", "client")]);

    let first = service.diff(&request);
    let second = service.diff(&request);
    assert_eq!(first, second);

    tree.rewrite("thirdparty", "core.games.txt", "v2");
    let third = changed(service.diff(&request));
    assert_eq!(third["core.games.txt"].hash, compute_content_hash(b"v2"));
}

#[test]
fn test_file_created_after_a_miss_is_found() {
    let tree = ContentTree::new();
    let service = tree.service(&[("thirdparty", None)]);
    let request = diff_fields("1.10.0", &[("gamedata/late.txt", "stale")]);

    assert!(changed(service.diff(&request)).is_empty());

    tree.write("thirdparty", "late.txt", "arrived");
    let changes = changed(service.diff(&request));
    assert_eq!(changes["late.txt"].hash, compute_content_hash(b"arrived"));
}

#[cfg(unix)]
#[test]
fn test_symlink_out_of_mount_is_not_hashed() {
    let tree = ContentTree::new();
    let secret = tree.write("private", "secret.txt", "secret");
    std::os::unix::fs::symlink(&secret, tree.mount_dir("thirdparty").join("secret.txt"))
        .unwrap();
    let service = tree.service(&[("thirdparty", None)]);

    let changes = changed(service.diff(&diff_fields(
        "1.10.0",
        &[("gamedata/secret.txt", "stale")],
    )));
    assert!(changes.is_empty());
}
