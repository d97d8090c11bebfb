use class_composer::{compose, BuildArgs};
use std::fs;
use std::os::unix::fs::symlink;
use std::path::PathBuf;
use tempfile::TempDir;

#[tokio::test]
async fn test_file_size_limit() {
    let temp_dir = TempDir::new().unwrap();

    // Create a file that's too large (> 10MB)
    let large_file = temp_dir.path().join("large.classes.json");
    let content = "a".repeat(11 * 1024 * 1024); // 11MB
    fs::write(&large_file, content).unwrap();

    // Create a normal file
    let normal_file = temp_dir.path().join("normal.classes.json");
    fs::write(&normal_file, r#"["flex"]"#).unwrap();

    let args = BuildArgs {
        input: vec![format!("{}/*.classes.json", temp_dir.path().display())],
        output: temp_dir.path().join("classes.txt"),
        output_manifest: temp_dir.path().join("manifest.json"),
        config: None,
        format: None,
        compact: false,
        verbose: true, // Enable verbose to see security warnings
        jobs: None,
        exclude: vec![],
        dry_run: true,
    };

    // Should succeed but skip the large file
    let result = compose(args).await.unwrap();
    assert_eq!(result.total_files_processed, 1); // Only the normal file
}

#[tokio::test]
async fn test_symlink_handling() {
    let temp_dir = TempDir::new().unwrap();

    // Create a real file
    let real_file = temp_dir.path().join("real.classes.json");
    fs::write(&real_file, r#"["flex"]"#).unwrap();

    // Create a symlink to the real file
    let symlink_file = temp_dir.path().join("symlink.classes.json");
    symlink(&real_file, &symlink_file).unwrap();

    // Create a symlink to outside the working directory
    let outside_dir = TempDir::new().unwrap();
    let outside_file = outside_dir.path().join("outside.classes.json");
    fs::write(&outside_file, r#"["bg-red-500"]"#).unwrap();
    let bad_symlink = temp_dir.path().join("bad_symlink.classes.json");
    symlink(&outside_file, &bad_symlink).unwrap();

    let args = BuildArgs {
        input: vec![format!("{}/*.classes.json", temp_dir.path().display())],
        output: temp_dir.path().join("classes.txt"),
        output_manifest: temp_dir.path().join("manifest.json"),
        config: None,
        format: None,
        compact: false,
        verbose: true,
        jobs: None,
        exclude: vec![],
        dry_run: true,
    };

    // Should process only the real file (symlinks are rejected by default)
    let result = compose(args).await.unwrap();
    assert_eq!(result.total_files_processed, 1);
}

#[tokio::test]
async fn test_path_traversal_protection() {
    let temp_dir = TempDir::new().unwrap();

    // Create a test file
    let test_file = temp_dir.path().join("test.classes.json");
    fs::write(&test_file, r#"["flex"]"#).unwrap();

    // Absolute output paths inside the temp directory are safe
    let args = BuildArgs {
        input: vec![format!("{}/*.classes.json", temp_dir.path().display())],
        output: temp_dir.path().join("classes.txt"),
        output_manifest: temp_dir.path().join("manifest.json"),
        config: None,
        format: None,
        compact: false,
        verbose: false,
        jobs: None,
        exclude: vec![],
        dry_run: true,
    };

    let result = compose(args).await;
    assert!(result.is_ok(), "Safe paths should be allowed");

    // Relative paths that climb out of the working directory are rejected
    let args_unsafe = BuildArgs {
        input: vec![format!("{}/*.classes.json", temp_dir.path().display())],
        output: PathBuf::from("../../../evil.txt"),
        output_manifest: PathBuf::from("../../../evil.json"),
        config: None,
        format: None,
        compact: false,
        verbose: false,
        jobs: None,
        exclude: vec![],
        dry_run: false,
    };

    let result_unsafe = compose(args_unsafe).await;
    assert!(result_unsafe.is_err());
    if let Err(e) = result_unsafe {
        let error_msg = format!("{}", e);
        assert!(error_msg.contains("traversal"),
                "Error should mention path traversal: {}", error_msg);
    }
}

#[tokio::test]
async fn test_relative_output_in_working_directory_is_allowed() {
    let temp_dir = TempDir::new().unwrap();

    let test_file = temp_dir.path().join("test.classes.json");
    fs::write(&test_file, r#"["flex"]"#).unwrap();

    // Relative output paths are fine when they stay in the working
    // directory, even before the files exist
    let args = BuildArgs {
        input: vec![format!("{}/*.classes.json", temp_dir.path().display())],
        output: PathBuf::from("fresh-classes.txt"),
        output_manifest: PathBuf::from("fresh-manifest.json"),
        config: None,
        format: None,
        compact: false,
        verbose: false,
        jobs: None,
        exclude: vec![],
        dry_run: true,
    };

    let result = compose(args).await;
    assert!(result.is_ok(), "Relative outputs inside the working directory should be allowed");
}

#[tokio::test]
async fn test_empty_file_handling() {
    let temp_dir = TempDir::new().unwrap();

    // Create an empty file
    let empty_file = temp_dir.path().join("empty.classes.json");
    fs::write(&empty_file, "").unwrap();

    // Create a whitespace-only file
    let blank_file = temp_dir.path().join("blank.classes.json");
    fs::write(&blank_file, "  \n\n").unwrap();

    // Create a normal file
    let normal_file = temp_dir.path().join("normal.classes.json");
    fs::write(&normal_file, r#"["flex", "flex-col", "items-center"]"#).unwrap();

    let args = BuildArgs {
        input: vec![format!("{}/*.classes.json", temp_dir.path().display())],
        output: temp_dir.path().join("classes.txt"),
        output_manifest: temp_dir.path().join("manifest.json"),
        config: None,
        format: None,
        compact: false,
        verbose: true,
        jobs: None,
        exclude: vec![],
        dry_run: false,
    };

    // Should handle empty files gracefully
    let result = compose(args).await.unwrap();
    assert_eq!(result.total_files_processed, 3);
    assert_eq!(result.total_expressions, 1); // Only the normal file has one
    assert_eq!(result.output_text, "flex flex-col items-center\n");
}

#[tokio::test]
async fn test_malformed_document_handling() {
    let temp_dir = TempDir::new().unwrap();

    // Create a file with malformed JSON
    let malformed_file = temp_dir.path().join("malformed.classes.json");
    fs::write(&malformed_file, r#"["flex", {{{ broken"#).unwrap();

    // Create a valid file
    let valid_file = temp_dir.path().join("valid.classes.json");
    fs::write(&valid_file, r#"["bg-blue-500"]"#).unwrap();

    let args = BuildArgs {
        input: vec![format!("{}/*.classes.json", temp_dir.path().display())],
        output: temp_dir.path().join("classes.txt"),
        output_manifest: temp_dir.path().join("manifest.json"),
        config: None,
        format: None,
        compact: false,
        verbose: true,
        jobs: None,
        exclude: vec![],
        dry_run: false,
    };

    // Should fail due to parse error
    let result = compose(args).await;
    assert!(result.is_err());
    if let Err(e) = result {
        // Check that we get a meaningful error message
        let error_msg = format!("{}", e);
        assert!(error_msg.contains("malformed.classes.json") || error_msg.contains("parse"));
    }
}

#[tokio::test]
async fn test_concurrent_file_processing_safety() {
    let temp_dir = TempDir::new().unwrap();

    // Create many files to test concurrent processing
    for i in 0..100 {
        let file = temp_dir.path().join(format!("file_{}.classes.json", i));
        fs::write(
            &file,
            format!(r#"["flex-{}", {{"bg-blue-{}": true}}]"#, i % 10, i % 5),
        )
        .unwrap();
    }

    // Test with different thread counts
    for threads in [1, 2, 4, 8, 16] {
        let args = BuildArgs {
            input: vec![format!("{}/*.classes.json", temp_dir.path().display())],
            output: temp_dir.path().join(format!("classes_{}.txt", threads)),
            output_manifest: temp_dir.path().join(format!("manifest_{}.json", threads)),
            config: None,
            format: None,
            compact: false,
            verbose: false,
            jobs: Some(threads),
            exclude: vec![],
            dry_run: false,
        };

        let result = compose(args).await.unwrap();
        assert_eq!(result.total_files_processed, 100);
        assert_eq!(result.total_expressions, 100);

        // One output line per expression, in file order
        assert_eq!(result.output_text.lines().count(), 100);
    }
}

#[tokio::test]
async fn test_permission_denied_handling() {
    use std::os::unix::fs::MetadataExt;
    use std::os::unix::fs::PermissionsExt;

    let temp_dir = TempDir::new().unwrap();

    // Permission bits don't restrict root
    if fs::metadata(temp_dir.path()).unwrap().uid() == 0 {
        return;
    }

    // Create a file with no read permissions
    let restricted_file = temp_dir.path().join("restricted.classes.json");
    fs::write(&restricted_file, r#"["flex"]"#).unwrap();

    // Remove read permissions
    let mut perms = fs::metadata(&restricted_file).unwrap().permissions();
    perms.set_mode(0o000);
    fs::set_permissions(&restricted_file, perms).unwrap();

    // Create a normal file
    let normal_file = temp_dir.path().join("normal.classes.json");
    fs::write(&normal_file, r#"["bg-green-500"]"#).unwrap();

    let args = BuildArgs {
        input: vec![format!("{}/*.classes.json", temp_dir.path().display())],
        output: temp_dir.path().join("classes.txt"),
        output_manifest: temp_dir.path().join("manifest.json"),
        config: None,
        format: None,
        compact: false,
        verbose: true,
        jobs: None,
        exclude: vec![],
        dry_run: true,
    };

    // Should fail due to permission denied
    let result = compose(args).await;

    // Restore permissions for cleanup
    let mut perms = fs::metadata(&restricted_file).unwrap().permissions();
    perms.set_mode(0o644);
    fs::set_permissions(&restricted_file, perms).unwrap();

    assert!(result.is_err());
}
