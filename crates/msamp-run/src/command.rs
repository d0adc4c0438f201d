use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use msamp_core::errors::{ErrorInfo, SampleError};
use msamp_core::{GeneratedSamples, MachineGenerator, MachineSample, SampleJob};

/// Environment variable telling the generator which mode it runs in.
pub const MODE_ENV: &str = "MSAMP_MODE";

const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Machine generator backed by an external program, one process per job.
///
/// The program is invoked as `<program> <args...> <model> <count> <seed>`.
/// In posterior mode the observations are written to its stdin, one per
/// line. Every non-empty stdout line is one sampled machine and stderr is
/// kept as diagnostic text.
#[derive(Debug, Clone)]
pub struct CommandGenerator {
    program: PathBuf,
    args: Vec<String>,
    timeout: Option<Duration>,
}

impl CommandGenerator {
    /// Creates a generator running `program` with no extra arguments.
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            timeout: None,
        }
    }

    /// Arguments inserted before the per-job arguments.
    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    /// Kills a job's process once it runs longer than `timeout`.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Program launched for each job.
    pub fn program(&self) -> &Path {
        &self.program
    }

    fn job_error(&self, job: &SampleJob, code: &str, message: impl Into<String>) -> SampleError {
        SampleError::Job(
            ErrorInfo::new(code, message)
                .with_context("program", self.program.display().to_string())
                .with_context("model", job.model_id.to_string()),
        )
    }
}

impl MachineGenerator for CommandGenerator {
    fn generate_samples(&self, job: &SampleJob) -> Result<GeneratedSamples, SampleError> {
        let mode = if job.data.is_some() {
            "posterior"
        } else {
            "prior"
        };
        let mut command = Command::new(&self.program);
        command
            .args(&self.args)
            .arg(job.model_id.as_str())
            .arg(job.count.to_string())
            .arg(job.seed.to_string())
            .env(MODE_ENV, mode)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        #[cfg(unix)]
        {
            use std::os::unix::process::CommandExt;
            // Leads its own group so a timeout can reach the whole tree.
            command.process_group(0);
        }
        let mut child = command
            .spawn()
            .map_err(|err| self.job_error(job, "generator_spawn", err.to_string()))?;

        let stdin = child.stdin.take();
        let stdout = child.stdout.take();
        let stderr = child.stderr.take();
        let payload = job
            .data()
            .map(|data| {
                let mut text = data.observations().join("\n");
                text.push('\n');
                text
            })
            .unwrap_or_default();

        let writer = thread::spawn(move || {
            if let Some(mut stdin) = stdin {
                // The child may exit without draining stdin.
                let _ = stdin.write_all(payload.as_bytes());
            }
        });
        let out_reader = thread::spawn(move || drain(stdout));
        let err_reader = thread::spawn(move || drain(stderr));

        let waited = wait_for(&mut child, self.timeout)
            .map_err(|err| self.job_error(job, "generator_wait", err.to_string()))?;
        let Some(status) = waited else {
            // Pipe threads stay detached; a descendant outside the group
            // may still hold the pipes.
            let limit = self.timeout.unwrap_or_default();
            return Err(self.job_error(
                job,
                "generator_timeout",
                format!("timed out after {:.3}s", limit.as_secs_f64()),
            ));
        };
        let _ = writer.join();
        let out = out_reader.join().unwrap_or_default();
        let err = err_reader.join().unwrap_or_default();
        let diagnostics = Some(err.trim().to_string()).filter(|text| !text.is_empty());
        if !status.success() {
            let mut message = format!("generator exited with {status}");
            if let Some(text) = &diagnostics {
                message.push_str(": ");
                message.push_str(text);
            }
            return Err(self.job_error(job, "generator_exit", message));
        }
        let machines = out
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(MachineSample::new)
            .collect();
        Ok(GeneratedSamples {
            machines,
            diagnostics,
        })
    }
}

fn drain<R: Read>(source: Option<R>) -> String {
    let mut buf = Vec::new();
    if let Some(mut source) = source {
        let _ = source.read_to_end(&mut buf);
    }
    String::from_utf8_lossy(&buf).into_owned()
}

/// Waits for the child, killing it at the deadline. `Ok(None)` means timeout.
fn wait_for(child: &mut Child, timeout: Option<Duration>) -> io::Result<Option<ExitStatus>> {
    let Some(limit) = timeout else {
        return child.wait().map(Some);
    };
    let deadline = Instant::now() + limit;
    loop {
        if let Some(status) = child.try_wait()? {
            return Ok(Some(status));
        }
        if Instant::now() >= deadline {
            kill_group(child);
            child.wait()?;
            return Ok(None);
        }
        thread::sleep(POLL_INTERVAL);
    }
}

/// Kills the child and, on unix, every process left in its group.
fn kill_group(child: &mut Child) {
    #[cfg(unix)]
    {
        let group = format!("-{}", child.id());
        let _ = Command::new("kill")
            .args(["-KILL", "--", group.as_str()])
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status();
    }
    let _ = child.kill();
}
