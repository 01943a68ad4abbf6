//! Default TOML config file content with documentation comments.

/// Generate the default TOML config content with comments.
pub(super) fn default_config_toml() -> &'static str {
    r##"# Portal Configuration
# Schema version 1
# Only override what you want to change -- missing fields use defaults.

[llm]
# server_url = "http://localhost:8080"   # /v1/chat/completions is appended
# model = "default"
# timeout = 300                          # seconds, 1-3600
# probe_timeout = 10                     # seconds, 1-120
# temperature = 0.6                      # 0.0-2.0
# top_p = 0.9                            # 0.0-1.0
# max_tokens = 4096                      # 1-131072
# skip_thinking = true
# stream_mode = "simulated"              # "simulated" or "sse"
# chunk_size = 10                        # characters per simulated chunk, 1-4096
# chunk_delay_ms = 10                    # 0-1000

[sessions]
# max_history = 20                       # user/assistant pairs kept, 1-1000
# serialize_turns = false                # one turn at a time per session
# idle_timeout_secs = 0                  # 0 = never evict

[logging]
# level = "info"                         # trace, debug, info, warn, error
"##
}
