//! Default field selections for the query tools.
//!
//! Each query tool accepts an optional `custom_return_attributes` selection.
//! When it is absent the tool falls back to one of the named projections
//! below. A custom selection replaces the default entirely.

/// A named, versioned GraphQL selection set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Projection {
    pub name: &'static str,
    pub version: u32,
    pub fields: &'static str,
}

impl Projection {
    /// Pick the caller's selection if it has any content, else this default.
    pub fn select<'a>(&self, custom: Option<&'a str>) -> &'a str {
        match custom {
            Some(fields) if !fields.trim().is_empty() => fields,
            _ => self.fields,
        }
    }
}

pub const COMMANDS: Projection = Projection {
    name: "commands",
    version: 1,
    fields: r#"
    cmd
    commandparameters {
      cli_name
      name
      type
      description
      default_value
      choices
      required
    }
    description
    help_cmd
    needs_admin
    "#,
};

pub const CALLBACKS: Projection = Projection {
    name: "callbacks",
    version: 1,
    fields: r#"
    architecture
    description
    domain
    external_ip
    host
    id
    display_id
    integrity_level
    ip
    extra_info
    sleep_info
    pid
    os
    user
    agent_callback_id
    operation_id
    process_name
    payload {
      os
      payloadtype {
        name
      }
      description
      uuid
    }
    "#,
};

pub const TASKS: Projection = Projection {
    name: "tasks",
    version: 1,
    fields: r#"
    callback {
      id
      display_id
    }
    id
    display_id
    operator {
      username
    }
    status
    completed
    original_params
    display_params
    timestamp
    command_name
    tasks {
      id
    }
    token {
      token_id
    }
    "#,
};

pub const PAYLOADS: Projection = Projection {
    name: "payloads",
    version: 1,
    fields: r#"
    build_message
    build_phase
    build_stderr
    callback_alert
    creation_time
    id
    operator {
      id
      username
    }
    uuid
    description
    deleted
    auto_generated
    payloadtype {
      id
      name
    }
    filemetum {
      agent_file_id
      filename_utf8
      id
    }
    payloadc2profiles {
      c2profile {
        running
        name
        is_p2p
        container_running
      }
    }
    "#,
};
