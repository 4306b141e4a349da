#[cfg(test)]
mod cli_tests {
    use std::fs;
    use std::path::PathBuf;
    use std::process::{Command, Output};

    use pretty_assertions::assert_eq;

    fn lazyfmt(args: &[&str]) -> Output {
        Command::new(env!("CARGO_BIN_EXE_lazyfmt"))
            .args(args)
            .output()
            .expect("lazyfmt should start")
    }

    fn scratch_file(name: &str, contents: &[u8]) -> PathBuf {
        let path = std::env::temp_dir().join(format!("lazyfmt-{}-{}", std::process::id(), name));
        fs::write(&path, contents).expect("temp dir should be writable");
        path
    }

    #[test]
    fn test_missing_template_file_is_reported() {
        let missing = std::env::temp_dir().join("lazyfmt-no-such-template.txt");
        let _ = fs::remove_file(&missing);

        let output = lazyfmt(&["render", missing.to_str().unwrap()]);

        assert!(!output.status.success());
        let stderr = String::from_utf8_lossy(&output.stderr);
        assert!(stderr.contains("Cannot open"), "stderr was: {}", stderr);
    }

    #[test]
    fn test_non_utf8_template_file_is_reported() {
        let path = scratch_file("latin1.txt", b"caf\xe9 {x}");

        let output = lazyfmt(&["render", path.to_str().unwrap()]);
        let _ = fs::remove_file(&path);

        assert!(!output.status.success());
        let stderr = String::from_utf8_lossy(&output.stderr);
        assert!(stderr.contains("not valid UTF-8"), "stderr was: {}", stderr);
    }

    #[test]
    fn test_render_with_globals() {
        let path = scratch_file("greeting.txt", b"hello {name}!");

        let output = lazyfmt(&[
            "render",
            path.to_str().unwrap(),
            "--globals",
            r#"{"name": "world"}"#,
        ]);
        let _ = fs::remove_file(&path);

        assert!(output.status.success());
        assert_eq!(String::from_utf8_lossy(&output.stdout), "hello world!\n");
    }
}
