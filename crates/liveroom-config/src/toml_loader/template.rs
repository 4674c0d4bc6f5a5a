//! Default TOML config template with inline documentation comments.

pub(crate) fn default_config_toml() -> String {
    r##"# Liveroom client configuration
# Schema version 1
# Only override what you want to change -- missing fields use defaults.

[channel]
# broker_url = "ws://localhost:8088/ws"
# reconnect_delay_ms = 5000     # fixed interval, retried forever
# connect_timeout_secs = 15
# heartbeat_ms = 10000          # 0 disables
# topic_prefix = "/topic/room"
# app_prefix = "/app"

[room]
# authority = "verify"          # "verify" | "trust"
# host_id = "teacher-001"

[whiteboard]
# width = 800
# height = 400
# flush_interval_ms = 50        # 10-1000
# history_limit = 50            # 1-200
# default_color = "#000000"
# default_width = 2.0           # 1-20

[documents]
# api_base_url = "http://localhost:8088"
# access_token = ""
# request_timeout_secs = 30

[negotiation]
# stun_servers = ["stun:stun.l.google.com:19302", "stun:stun1.l.google.com:19302"]

[entitlements]
# camera = true
# mic = true
# screen_share = false
# chat = true
# whiteboard = false
# file_upload = false

[chat]
# history_limit = 500
# typing_timeout_ms = 1000

[logging]
# level = "info"                # trace | debug | info | warn | error
"##
    .to_string()
}
