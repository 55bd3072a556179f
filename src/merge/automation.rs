//! Native automation of a presentation application.
//!
//! The executor drives the host through [`SlideAutomation`] only. The one
//! adapter shipped here, [`VbScriptSession`], generates a VBScript for
//! PowerPoint and runs it with `cscript` under a time limit. It is built on
//! Windows with the `automation` feature.

use std::fmt::Write as FmtWrite;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Default bound on one automation run.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(300);

/// Bound on the cleanup run after a timed-out script.
pub const TEARDOWN_TIMEOUT: Duration = Duration::from_secs(15);

/// Marker the script prints, followed by the number of slides inserted.
const SUCCESS_MARKER: &str = "SUCCESS";

/// Presentation tag naming the run that created a target deck.
const RUN_TAG: &str = "LITURGY_DECK_RUN";

/// Why an automation run was abandoned.
#[derive(Error, Debug)]
pub enum AutomationError {
    /// The host application or script runner cannot be used here
    #[error("automation unavailable: {0}")]
    Unavailable(String),

    #[error("automation timed out after {}s", .0.as_secs())]
    Timeout(Duration),

    /// The script ran and reported failure
    #[error("automation script failed ({status}): {stderr}")]
    ScriptFailed { status: String, stderr: String },

    /// The script ended without reporting success
    #[error("automation script did not report success: {0}")]
    NoSuccessMarker(String),

    #[error("automation finished but {} was not written", .0.display())]
    MissingOutput(PathBuf),

    /// Fewer or more slides were inserted than planned, so output
    /// positions no longer match the plan
    #[error("automation inserted {inserted} slides, {expected} were planned")]
    CountMismatch { expected: usize, inserted: usize },

    /// The session was used after `save_as` or `close`
    #[error("automation session already finished")]
    Finished,

    #[error("automation I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// A session with a host application that can copy slides natively.
///
/// Slides are inserted in call order at a running cursor; the host's own
/// empty starting slide, if any, is removed before saving.
pub trait SlideAutomation {
    /// Insert slides `first..=last` (0-based) of `source` after the slides
    /// inserted so far.
    fn insert_slide_range(&mut self, source: &Path, first: usize, last: usize) -> Result<(), AutomationError>;

    /// Save the assembled presentation as `.pptx` to `output`. Returns the
    /// number of slides the host inserted.
    fn save_as(&mut self, output: &Path) -> Result<usize, AutomationError>;

    /// End the session. Safe to call more than once and after errors.
    fn close(&mut self) -> Result<(), AutomationError>;
}

/// Whether this build can drive a host application at all.
#[inline]
pub fn automation_supported() -> bool {
    cfg!(all(windows, feature = "automation"))
}

/// A VBScript string literal.
fn vbs_string(value: &str) -> String {
    format!("\"{}\"", value.replace('"', "\"\""))
}

fn windows_path(path: &Path) -> String {
    path.display().to_string().replace('/', "\\")
}

/// Text of a PowerPoint automation script, built one insertion at a time.
#[derive(Debug, Clone)]
pub struct VbScript {
    body: String,
    insertions: usize,
    run_id: String,
}

impl Default for VbScript {
    fn default() -> Self {
        Self::new()
    }
}

impl VbScript {
    pub fn new() -> Self {
        let run_id = uuid::Uuid::new_v4().simple().to_string();
        let mut body = String::with_capacity(4096);
        for line in [
            "Option Explicit",
            "",
            "Const ppSaveAsOpenXMLPresentation = 24",
            "Const ppWindowMinimized = 2",
            "",
            "Dim pptApp, targetPres, inserted, initialCount, i, saveError",
            "",
            "On Error Resume Next",
            "Set pptApp = CreateObject(\"PowerPoint.Application\")",
            "If Err.Number <> 0 Then",
            "    WScript.StdErr.WriteLine \"Could not start PowerPoint: \" & Err.Description",
            "    WScript.Quit 2",
            "End If",
            "pptApp.Visible = True",
            "pptApp.WindowState = ppWindowMinimized",
            "",
            "Set targetPres = pptApp.Presentations.Add(True)",
            "initialCount = targetPres.Slides.Count",
            "inserted = 0",
        ] {
            body.push_str(line);
            body.push_str("\r\n");
        }
        let _ = write!(
            body,
            "targetPres.Tags.Add {}, {}\r\nWScript.Sleep 500\r\n\r\n",
            vbs_string(RUN_TAG),
            vbs_string(&run_id)
        );
        Self {
            body,
            insertions: 0,
            run_id,
        }
    }

    /// Id tagged onto the target presentation of this script.
    #[inline]
    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    /// Script that closes the presentations this run left open and quits
    /// PowerPoint when nothing else is open in it. Other presentations are
    /// left alone.
    pub fn teardown(&self) -> String {
        let tag = vbs_string(RUN_TAG);
        let run = vbs_string(&self.run_id);
        [
            "On Error Resume Next".to_string(),
            "Dim pptApp, i".to_string(),
            "Set pptApp = GetObject(, \"PowerPoint.Application\")".to_string(),
            "If Err.Number <> 0 Then WScript.Quit 0".to_string(),
            "For i = pptApp.Presentations.Count To 1 Step -1".to_string(),
            format!("    If pptApp.Presentations(i).Tags({}) = {} Then pptApp.Presentations(i).Close", tag, run),
            "Next".to_string(),
            "If pptApp.Presentations.Count = 0 Then pptApp.Quit".to_string(),
            "Set pptApp = Nothing".to_string(),
            "WScript.Quit 0".to_string(),
        ]
        .join("\r\n")
    }

    /// Slides the script will try to insert.
    #[inline]
    pub fn planned(&self) -> usize {
        self.insertions
    }

    /// Insert `first..=last` of `source`, one `InsertFromFile` per slide so
    /// every slide lands exactly at the cursor.
    pub fn insert(&mut self, source: &Path, first: usize, last: usize) {
        let file = vbs_string(&windows_path(source));
        let name = source.file_name().map(|n| n.to_string_lossy()).unwrap_or_default();
        let _ = write!(self.body, "' {}\r\n", name.replace(['\r', '\n'], " "));
        for index in first..=last {
            // InsertFromFile FileName, Index, SlideStart, SlideEnd (1-based)
            let _ = write!(
                self.body,
                "Err.Clear\r\ntargetPres.Slides.InsertFromFile {file}, inserted, {n}, {n}\r\nIf Err.Number = 0 Then inserted = inserted + 1\r\nWScript.Sleep 100\r\n",
                file = file,
                n = index + 1
            );
            self.insertions += 1;
        }
        self.body.push_str("\r\n");
    }

    /// The complete script, saving to `output`.
    pub fn finish(&self, output: &Path) -> String {
        let mut script = self.body.clone();
        for line in [
            "' The host's own starting slides now follow the inserted ones.",
            "If initialCount > 0 Then",
            "    For i = targetPres.Slides.Count To inserted + 1 Step -1",
            "        If targetPres.Slides(i).Shapes.Count = 0 Then targetPres.Slides(i).Delete",
            "    Next",
            "End If",
            "",
            "Err.Clear",
        ] {
            script.push_str(line);
            script.push_str("\r\n");
        }
        let _ = write!(
            script,
            "targetPres.SaveAs {}, ppSaveAsOpenXMLPresentation\r\n",
            vbs_string(&windows_path(output))
        );
        for line in [
            "saveError = Err.Description",
            "targetPres.Close",
            "pptApp.Quit",
            "Set targetPres = Nothing",
            "Set pptApp = Nothing",
            "",
            "If saveError <> \"\" Then",
            "    WScript.StdErr.WriteLine \"SaveAs failed: \" & saveError",
            "    WScript.Quit 3",
            "End If",
        ] {
            script.push_str(line);
            script.push_str("\r\n");
        }
        let _ = write!(script, "WScript.Echo \"{} \" & inserted\r\nWScript.Quit 0\r\n", SUCCESS_MARKER);
        script
    }
}

/// Number of inserted slides from the script's standard output.
pub fn parse_success(stdout: &str) -> Result<usize, AutomationError> {
    stdout
        .lines()
        .filter_map(|line| line.trim().strip_prefix(SUCCESS_MARKER))
        .find_map(|rest| rest.trim().parse().ok())
        .ok_or_else(|| AutomationError::NoSuccessMarker(stdout.trim().to_string()))
}

/// PowerPoint driven through a generated VBScript.
///
/// Insertions are collected into the script; `save_as` runs it.
#[derive(Debug)]
pub struct VbScriptSession {
    script: VbScript,
    timeout: Duration,
    finished: bool,
}

impl VbScriptSession {
    pub fn new(timeout: Duration) -> Result<Self, AutomationError> {
        if !automation_supported() {
            return Err(AutomationError::Unavailable(
                "PowerPoint automation needs Windows and the `automation` feature".to_string(),
            ));
        }
        Ok(Self {
            script: VbScript::new(),
            timeout,
            finished: false,
        })
    }
}

impl SlideAutomation for VbScriptSession {
    fn insert_slide_range(&mut self, source: &Path, first: usize, last: usize) -> Result<(), AutomationError> {
        if self.finished {
            return Err(AutomationError::Finished);
        }
        self.script.insert(source, first, last);
        Ok(())
    }

    fn save_as(&mut self, output: &Path) -> Result<usize, AutomationError> {
        if self.finished {
            return Err(AutomationError::Finished);
        }
        self.finished = true;
        let stdout = runner::run(&self.script.finish(output), &self.script.teardown(), self.timeout)?;
        let inserted = parse_success(&stdout)?;
        if !output.is_file() {
            return Err(AutomationError::MissingOutput(output.to_path_buf()));
        }
        Ok(inserted)
    }

    /// Only marks the session finished. The generated script quits
    /// PowerPoint itself, and a timed-out run is cleaned up by `save_as`.
    fn close(&mut self) -> Result<(), AutomationError> {
        self.finished = true;
        Ok(())
    }
}

#[cfg(all(windows, feature = "automation"))]
mod runner {
    use super::{AutomationError, TEARDOWN_TIMEOUT};
    use std::io::Write;
    use std::path::Path;
    use std::process::Stdio;
    use std::time::Duration;
    use tokio::process::Command;
    use tokio::time::timeout;
    use tempfile::NamedTempFile;
    use tracing::{debug, warn};

    // cscript reads UTF-16 scripts with a BOM, which keeps non-ASCII
    // paths intact.
    fn script_file(script: &str) -> Result<NamedTempFile, AutomationError> {
        let mut file = tempfile::Builder::new().prefix("liturgy-merge-").suffix(".vbs").tempfile()?;
        let mut bytes = vec![0xFF, 0xFE];
        bytes.extend(script.encode_utf16().flat_map(u16::to_le_bytes));
        file.write_all(&bytes)?;
        file.flush()?;
        Ok(file)
    }

    /// Run `script` with `cscript` and return its standard output.
    ///
    /// On timeout `cscript` is killed, but PowerPoint runs outside its
    /// process tree. `teardown` is then run, itself bounded, to close what
    /// the script opened. A PowerPoint that is hung hard enough to ignore
    /// automation stays behind.
    pub(super) fn run(script: &str, teardown: &str, limit: Duration) -> Result<String, AutomationError> {
        let file = script_file(script)?;
        let runtime = tokio::runtime::Builder::new_current_thread().enable_all().build()?;
        match runtime.block_on(cscript(file.path(), limit)) {
            Err(AutomationError::Timeout(limit)) => {
                let cleanup = script_file(teardown)
                    .and_then(|file| runtime.block_on(cscript(file.path(), TEARDOWN_TIMEOUT)));
                if let Err(e) = cleanup {
                    warn!(error = %e, "could not close PowerPoint after timeout");
                }
                Err(AutomationError::Timeout(limit))
            },
            result => result,
        }
    }

    async fn cscript(script: &Path, limit: Duration) -> Result<String, AutomationError> {
        let mut cmd = Command::new("cscript");
        cmd.arg("//Nologo")
            .arg(script)
            .kill_on_drop(true)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        let child = cmd
            .spawn()
            .map_err(|e| AutomationError::Unavailable(format!("cannot start cscript: {}", e)))?;

        debug!(script = %script.display(), "running automation script");
        let output = match timeout(limit, child.wait_with_output()).await {
            Ok(result) => result?,
            Err(_) => return Err(AutomationError::Timeout(limit)),
        };

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            return Err(AutomationError::ScriptFailed {
                status: output.status.to_string(),
                stderr: if stderr.is_empty() { stdout.trim().to_string() } else { stderr },
            });
        }
        Ok(stdout)
    }
}

#[cfg(not(all(windows, feature = "automation")))]
mod runner {
    use super::AutomationError;
    use std::time::Duration;

    pub(super) fn run(_script: &str, _teardown: &str, _limit: Duration) -> Result<String, AutomationError> {
        Err(AutomationError::Unavailable("no script host on this platform".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_one_insert_per_slide() {
        let mut script = VbScript::new();
        script.insert(Path::new("C:/Liederen/Psalm 23.pptx"), 0, 2);
        script.insert(Path::new("C:/Algemeen/Welkom.pptx"), 4, 4);
        assert_eq!(script.planned(), 4);

        let text = script.finish(Path::new("C:/Vieringen/out.pptx"));
        assert_eq!(text.matches("InsertFromFile").count(), 4);
        assert!(text.contains(r#"InsertFromFile "C:\Liederen\Psalm 23.pptx", inserted, 3, 3"#));
        assert!(text.contains(r#"InsertFromFile "C:\Algemeen\Welkom.pptx", inserted, 5, 5"#));
        assert!(text.contains(r#"targetPres.SaveAs "C:\Vieringen\out.pptx", ppSaveAsOpenXMLPresentation"#));
        assert!(text.contains("pptApp.Quit"));
        assert!(text.lines().all(|l| !l.contains('\n')));
    }

    #[test]
    fn test_teardown_closes_only_this_run() {
        let script = VbScript::new();
        let id = script.run_id().to_string();
        assert_ne!(id, VbScript::new().run_id());

        let text = script.finish(Path::new("C:/Vieringen/out.pptx"));
        assert!(text.contains(&format!(r#"targetPres.Tags.Add "LITURGY_DECK_RUN", "{}""#, id)));

        let teardown = script.teardown();
        assert!(teardown.contains(&format!(r#".Tags("LITURGY_DECK_RUN") = "{}" Then"#, id)));
        assert!(teardown.contains("If pptApp.Presentations.Count = 0 Then pptApp.Quit"));
        assert!(!teardown.contains("CreateObject"));
    }

    #[test]
    fn test_quotes_are_escaped() {
        assert_eq!(vbs_string(r#"a "b" c"#), r#""a ""b"" c""#);
    }

    #[test]
    fn test_parse_success() {
        assert_eq!(parse_success("SUCCESS 12\r\n").unwrap(), 12);
        assert_eq!(parse_success("warming up\nSUCCESS 0\n").unwrap(), 0);
        assert!(matches!(
            parse_success("Error: boom"),
            Err(AutomationError::NoSuccessMarker(_))
        ));
    }

    #[test]
    fn test_timeout_message() {
        let err = AutomationError::Timeout(DEFAULT_TIMEOUT);
        assert_eq!(err.to_string(), "automation timed out after 300s");
    }

    #[cfg(not(all(windows, feature = "automation")))]
    #[test]
    fn test_unavailable_off_windows() {
        assert!(!automation_supported());
        assert!(matches!(
            VbScriptSession::new(DEFAULT_TIMEOUT),
            Err(AutomationError::Unavailable(_))
        ));
    }
}
