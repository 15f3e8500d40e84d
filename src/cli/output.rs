//! Output mode shared by every command: `--json` prints one
//! `serde_json::to_string_pretty` blob, otherwise the handler's own
//! human-readable rendering runs. `--quiet` suppresses the latter's
//! non-essential lines; callers check `mode.quiet` themselves.

#[derive(Clone, Copy, Debug)]
pub struct OutputMode {
    pub json: bool,
    pub verbose: bool,
    pub quiet: bool,
}

impl OutputMode {
    pub fn emit(&self, value: &impl serde::Serialize, human: impl FnOnce()) {
        if self.json {
            match serde_json::to_string_pretty(value) {
                Ok(s) => println!("{s}"),
                Err(e) => eprintln!("failed to serialize output: {e}"),
            }
        } else {
            human();
        }
    }
}
