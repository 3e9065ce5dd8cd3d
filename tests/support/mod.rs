// file: tests/support/mod.rs
// version: 1.0.0
// guid: 7a1e4c92-3d6b-4f05-8c27-e9b0d5a2f163

//! Shared fixtures for integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use gateway_deploy::config::DeployConfig;
use gateway_deploy::context::DeploymentContext;
use gateway_deploy::runner::{CommandOutput, CommandRunner, CommandSpec};
use gateway_deploy::Result;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tempfile::TempDir;

pub const UNIT_TEMPLATE: &str = "[Unit]
Description=SMS Gateway API
After=network.target

[Service]
Type=simple
User=pi
WorkingDirectory=/home/pi/sms-gateway
EnvironmentFile=/home/pi/sms-gateway/.env
ExecStart=/home/pi/sms-gateway/venv/bin/python main.py
Restart=always

[Install]
WantedBy=multi-user.target
";

pub const ENV_TEMPLATE: &str = "# SMS gateway settings
HOST=0.0.0.0
PORT=8000
API_KEY=change-me
LOG_LEVEL=INFO
";

/// Records every command and answers from a small script
pub struct FakeRunner {
    calls: Mutex<Vec<CommandSpec>>,
    missing_programs: Vec<String>,
    failures: Vec<(String, i32, String)>,
    inactive: bool,
}

impl FakeRunner {
    pub fn new() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            missing_programs: Vec::new(),
            failures: Vec::new(),
            inactive: false,
        }
    }

    /// `program_exists` reports false for this program
    pub fn without_program(mut self, program: &str) -> Self {
        self.missing_programs.push(program.to_string());
        self
    }

    /// Any command whose rendering contains `needle` exits with `code`
    pub fn failing(mut self, needle: &str, code: i32, stderr: &str) -> Self {
        self.failures
            .push((needle.to_string(), code, stderr.to_string()));
        self
    }

    /// `systemctl is-active` reports the service as failed
    pub fn inactive_service(mut self) -> Self {
        self.inactive = true;
        self
    }

    pub fn calls(&self) -> Vec<CommandSpec> {
        self.calls.lock().unwrap().clone()
    }

    /// Rendered commands, in order
    pub fn commands(&self) -> Vec<String> {
        self.calls().iter().map(|c| c.to_string()).collect()
    }

    pub fn ran(&self, needle: &str) -> bool {
        self.commands().iter().any(|c| c.contains(needle))
    }

    fn ok(stdout: &str) -> CommandOutput {
        CommandOutput {
            exit_code: Some(0),
            stdout: stdout.to_string(),
            stderr: String::new(),
        }
    }
}

#[async_trait]
impl CommandRunner for FakeRunner {
    async fn run(&self, command: &CommandSpec) -> Result<CommandOutput> {
        self.calls.lock().unwrap().push(command.clone());
        let rendered = command.to_string();

        if let Some((_, code, stderr)) = self
            .failures
            .iter()
            .find(|(needle, _, _)| rendered.contains(needle.as_str()))
        {
            return Ok(CommandOutput {
                exit_code: Some(*code),
                stdout: String::new(),
                stderr: stderr.clone(),
            });
        }

        let args: Vec<&str> = command.args.iter().map(String::as_str).collect();
        match (command.program.as_str(), args.as_slice()) {
            (_, ["--version"]) => Ok(Self::ok("Python 3.11.2\n")),
            (_, ["-m", "venv", dir]) => {
                std::fs::create_dir_all(Path::new(dir).join("bin"))?;
                Ok(Self::ok(""))
            }
            ("install", ["-m", _, src, dst]) => {
                std::fs::copy(src, dst)?;
                Ok(Self::ok(""))
            }
            ("systemctl", ["is-active", _]) if self.inactive => Ok(CommandOutput {
                exit_code: Some(3),
                stdout: "failed\n".to_string(),
                stderr: String::new(),
            }),
            ("systemctl", ["is-active", _]) => Ok(Self::ok("active\n")),
            ("systemctl", ["status", name, ..]) => Ok(Self::ok(&format!(
                "● {}.service - SMS Gateway API\n     Active: active (running)\n",
                name
            ))),
            _ => Ok(Self::ok("")),
        }
    }

    async fn program_exists(&self, program: &str) -> bool {
        !self.missing_programs.iter().any(|p| p == program)
    }
}

/// Application directory plus a separate directory standing in for systemd's
pub struct Fixture {
    pub app: TempDir,
    pub unit_dir: TempDir,
}

impl Fixture {
    /// A complete application checkout
    pub fn new() -> Self {
        let fixture = Self::bare();
        fixture.write("main.py", "print('sms gateway')\n");
        fixture.write("requirements.txt", "fastapi\nuvicorn\n");
        fixture.write(".env.example", ENV_TEMPLATE);
        fixture.write("sms-gateway.service", UNIT_TEMPLATE);
        fixture
    }

    /// Empty application directory
    pub fn bare() -> Self {
        Self {
            app: TempDir::new().unwrap(),
            unit_dir: TempDir::new().unwrap(),
        }
    }

    pub fn path(&self, relative: &str) -> PathBuf {
        self.app.path().join(relative)
    }

    pub fn write(&self, relative: &str, content: &str) {
        std::fs::write(self.path(relative), content).unwrap();
    }

    pub fn remove(&self, relative: &str) {
        std::fs::remove_file(self.path(relative)).unwrap();
    }

    pub fn read(&self, relative: &str) -> String {
        std::fs::read_to_string(self.path(relative)).unwrap()
    }

    pub fn installed_unit(&self) -> PathBuf {
        self.unit_dir.path().join("sms-gateway.service")
    }

    pub fn config(&self) -> DeployConfig {
        let mut config = DeployConfig::default();
        config.service.unit_dir = self.unit_dir.path().to_path_buf();
        config.service.activation_delay_secs = 0;
        config
    }

    pub fn context(&self, config: &DeployConfig) -> DeploymentContext {
        DeploymentContext::resolve_for_user(self.app.path(), config, "deploy").unwrap()
    }
}
