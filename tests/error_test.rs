use nshost::utils::errors::{HostError, LifecycleStage};
use std::path::PathBuf;

#[test]
fn test_error_stages() {
    assert_eq!(
        HostError::Config("bad".to_string()).stage(),
        LifecycleStage::Configure
    );
    assert_eq!(
        HostError::LibraryLoad {
            path: PathBuf::from("libs/x.so"),
            reason: "nope".to_string()
        }
        .stage(),
        LifecycleStage::Load
    );
    assert_eq!(
        HostError::InitializationFailure {
            base_dir: PathBuf::from("/app"),
            handle: 0
        }
        .stage(),
        LifecycleStage::Initialize
    );
    assert_eq!(
        HostError::EntryScriptUnreadable {
            path: PathBuf::from("/app/App/main.js"),
            reason: "No such file or directory".to_string()
        }
        .stage(),
        LifecycleStage::ReadScript
    );
}

#[test]
fn test_exit_codes_are_distinct_and_non_zero() {
    let errors = [
        HostError::Config("bad".to_string()),
        HostError::MissingSymbol("runtime_init"),
        HostError::NonUtf8Path(PathBuf::from("/app")),
        HostError::EntryScriptUnreadable {
            path: PathBuf::from("/app/App/main.js"),
            reason: "missing".to_string(),
        },
    ];
    let codes: Vec<i32> = errors.iter().map(HostError::exit_code).collect();

    assert!(codes.iter().all(|c| *c != 0));
    assert_eq!(codes, vec![78, 69, 70, 66]);
}

#[test]
fn test_error_codes() {
    assert_eq!(
        HostError::MissingSymbol("runtime_deinit").error_code(),
        "MISSING_SYMBOL"
    );
    assert_eq!(
        HostError::InteriorNul {
            what: "entry script",
            position: 4
        }
        .error_code(),
        "INTERIOR_NUL"
    );
}

#[test]
fn test_diagnostic_names_stage() {
    let err = HostError::EntryScriptUnreadable {
        path: PathBuf::from("/app/App/main.js"),
        reason: "No such file or directory (os error 2)".to_string(),
    };
    let diagnostic = err.diagnostic();
    assert!(diagnostic.starts_with("error[ENTRY_SCRIPT_UNREADABLE] read_script failed:"));
    assert!(diagnostic.contains("/app/App/main.js"));
}
