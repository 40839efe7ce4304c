//! Bootstrap payload for NAT instances
//!
//! The fck-nat AMI reads `/etc/fck-nat.conf` on service start. Each directive
//! is appended with an `echo` command and the service is restarted last, so
//! the order of commands is part of the contract with the image.

use std::fmt;

/// Config file read by the fck-nat service
pub const CONFIG_PATH: &str = "/etc/fck-nat.conf";

/// Command that applies the configuration
pub const RESTART_COMMAND: &str = "service fck-nat restart";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserData {
    commands: Vec<String>,
}

impl UserData {
    pub fn for_linux() -> Self {
        Self::default()
    }

    pub fn add_commands<I, S>(&mut self, commands: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.commands.extend(commands.into_iter().map(Into::into));
    }

    /// Append a `key=value` directive to the fck-nat config file
    pub fn add_directive(&mut self, key: &str, value: impl fmt::Display) {
        self.commands
            .push(format!("echo \"{}={}\" >> {}", key, value, CONFIG_PATH));
    }

    pub fn commands(&self) -> &[String] {
        &self.commands
    }

    /// Render as a shell script
    pub fn render(&self) -> String {
        let mut script = String::from("#!/bin/bash\n");
        for command in &self.commands {
            script.push_str(command);
            script.push('\n');
        }
        script
    }

    /// Payload for one NAT instance
    ///
    /// `eni_id` always comes first, then the optional EIP allocation, then
    /// the CloudWatch agent flags, then the restart.
    pub fn for_nat_instance(
        eni_id: impl fmt::Display,
        eip_id: Option<&str>,
        cloudwatch_param: Option<impl fmt::Display>,
    ) -> Self {
        let mut user_data = Self::for_linux();
        user_data.add_directive("eni_id", eni_id);
        if let Some(eip) = eip_id {
            user_data.add_directive("eip_id", eip);
        }
        if let Some(param) = cloudwatch_param {
            user_data.add_directive("cwagent_enabled", "true");
            user_data.add_directive("cwagent_cfg_param_name", param);
        }
        user_data.add_commands([RESTART_COMMAND]);
        user_data
    }
}

impl fmt::Display for UserData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.render())
    }
}
