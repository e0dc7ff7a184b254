//! Test utilities: an in-process test server driven against fixture tool
//! scripts standing in for the real qpdf binary.

use axum_test::TestServer;
use axum_test::multipart::{MultipartForm, Part};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

use crate::config::Config;

/// Everything a test needs: the server, the workspace root to inspect for
/// cleanup, and the scratch directory keeping the fixture script alive.
pub struct TestContext {
    pub server: TestServer,
    pub workspace_root: PathBuf,
    _scratch: TempDir,
}

/// Fixture behaviors standing in for the encryption tool.
///
/// All of them receive the real argument vectors, so the invocation shape is
/// exercised even though no actual encryption happens.
#[derive(Debug, Clone, Copy)]
pub enum FakeTool {
    /// Copies the input operand to the output operand and exits 0.
    Copy,
    /// Writes the user-password argument to the output and exits 0.
    EchoPassword,
    /// Writes the key-length argument to the output and exits 0.
    EchoBits,
    /// Prints a diagnostic to stderr and exits 2.
    Fail,
    /// Sleeps well past any test timeout.
    Hang,
}

pub fn create_test_app(tool: FakeTool) -> TestContext {
    create_test_app_with(tool, |_config| {})
}

pub fn create_test_app_with(tool: FakeTool, adjust: impl FnOnce(&mut Config)) -> TestContext {
    let scratch = tempfile::tempdir().expect("Failed to create scratch directory");
    let workspace_root = scratch.path().join("workspaces");

    let mut config = Config::default();
    config.tool.binary = write_fake_tool(scratch.path(), tool);
    config.workspace.root = Some(workspace_root.clone());
    adjust(&mut config);

    let server = crate::Application::new(config).into_test_server();

    TestContext {
        server,
        workspace_root,
        _scratch: scratch,
    }
}

/// A protect/unlock form with the given document bytes and password.
pub fn upload_form(document: &[u8], password: &str) -> MultipartForm {
    MultipartForm::new()
        .add_text("password", password)
        .add_part("file", Part::bytes(document.to_vec()).file_name("test.pdf"))
}

fn write_fake_tool(dir: &Path, tool: FakeTool) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    // The protect form is `--encrypt <pw> <pw> <bits> -- <in> <out>` and the
    // unlock form is `--password=<pw> --decrypt -- <in> <out>`; in both the
    // last two operands are the input and output paths.
    let script = match tool {
        FakeTool::Copy => concat!(
            "#!/bin/sh\n",
            "prev=\"\"; last=\"\"\n",
            "for arg in \"$@\"; do prev=\"$last\"; last=\"$arg\"; done\n",
            "cp \"$prev\" \"$last\"\n",
        ),
        FakeTool::EchoPassword => concat!(
            "#!/bin/sh\n",
            "prev=\"\"; last=\"\"\n",
            "for arg in \"$@\"; do prev=\"$last\"; last=\"$arg\"; done\n",
            "printf '%s' \"$2\" > \"$last\"\n",
        ),
        FakeTool::EchoBits => concat!(
            "#!/bin/sh\n",
            "prev=\"\"; last=\"\"\n",
            "for arg in \"$@\"; do prev=\"$last\"; last=\"$arg\"; done\n",
            "printf '%s' \"$4\" > \"$last\"\n",
        ),
        FakeTool::Fail => "#!/bin/sh\necho 'invalid password' >&2\nexit 2\n",
        FakeTool::Hang => "#!/bin/sh\nsleep 600\n",
    };

    let path = dir.join("fake-qpdf");
    std::fs::write(&path, script).expect("Failed to write fixture tool");
    let mut permissions = std::fs::metadata(&path).expect("Failed to stat fixture tool").permissions();
    permissions.set_mode(0o755);
    std::fs::set_permissions(&path, permissions).expect("Failed to mark fixture tool executable");
    path
}
