#![cfg(unix)]

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use rewards_oracle::{CliOracle, OracleClient, OracleConfig, OracleError, SecretFile};

// Writing an executable while another test thread forks can leave it busy.
static TOOLS: Mutex<()> = Mutex::new(());

fn write_tool(dir: &Path, name: &str, body: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
    let mut perms = fs::metadata(&path).unwrap().permissions();
    perms.set_mode(0o755);
    fs::set_permissions(&path, perms).unwrap();
    path
}

fn config(solana: &Path, keygen: &Path, spl_token: &Path) -> OracleConfig {
    OracleConfig::default()
        .with_solana_bin(solana.to_str().unwrap())
        .with_keygen_bin(keygen.to_str().unwrap())
        .with_spl_token_bin(spl_token.to_str().unwrap())
}

#[test]
fn test_balances_through_real_processes() {
    let _guard = TOOLS.lock().unwrap_or_else(|e| e.into_inner());
    let dir = tempfile::tempdir().unwrap();

    let solana = write_tool(dir.path(), "solana", r#"echo "42.5 SOL""#);
    let keygen = write_tool(dir.path(), "solana-keygen", "exit 1");
    let spl = write_tool(
        dir.path(),
        "spl-token",
        r#"if [ "$1" = "balance" ]; then echo "1200"; else echo "unexpected" >&2; exit 1; fi"#,
    );

    let oracle = CliOracle::new(config(&solana, &keygen, &spl));
    assert_eq!(oracle.native_balance("Member1").unwrap(), 42.5);
    assert_eq!(oracle.token_balance("Mint1", "Member1").unwrap(), 1200);

    let err = oracle.create_mint(9).unwrap_err();
    assert!(matches!(err, OracleError::ToolFailed { .. }));
    assert_eq!(err.diagnostic(), "unexpected");
}

#[test]
fn test_recover_reads_phrase_file() {
    let _guard = TOOLS.lock().unwrap_or_else(|e| e.into_inner());
    let dir = tempfile::tempdir().unwrap();

    // Echo the first word back as the "public key" so the file must have been readable.
    let keygen = write_tool(
        dir.path(),
        "solana-keygen",
        r#"eval "f=\${$#}"; cut -d' ' -f1 "$f""#,
    );
    let solana = write_tool(dir.path(), "solana", "exit 1");
    let spl = write_tool(dir.path(), "spl-token", "exit 1");

    let oracle = CliOracle::new(config(&solana, &keygen, &spl));
    let secret = SecretFile::create("raven snap earn").unwrap();
    assert_eq!(oracle.recover_public_key(&secret).unwrap(), "raven");
}

#[test]
fn test_transfer_with_stderr_is_rejected() {
    let _guard = TOOLS.lock().unwrap_or_else(|e| e.into_inner());
    let dir = tempfile::tempdir().unwrap();

    let spl = write_tool(
        dir.path(),
        "spl-token",
        r#"echo "Signature: abc123"; echo "Error: insufficient funds" >&2"#,
    );
    let solana = write_tool(dir.path(), "solana", "exit 1");
    let keygen = write_tool(dir.path(), "solana-keygen", "exit 1");

    let oracle = CliOracle::new(config(&solana, &keygen, &spl));
    let err = oracle
        .transfer("Mint1", 10, "Member1", "Treasury")
        .unwrap_err();
    assert_eq!(err.diagnostic(), "Error: insufficient funds");
}

#[test]
fn test_missing_tool() {
    let oracle = CliOracle::new(
        OracleConfig::default().with_solana_bin("/nonexistent/solana-binary"),
    );
    let err = oracle.native_balance("Member1").unwrap_err();
    assert!(matches!(err, OracleError::Spawn { .. }));
}
