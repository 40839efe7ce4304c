//! Default CloudWatch agent configuration for NAT instances

use serde_json::json;

/// Metric namespace the agent publishes to
pub const NAMESPACE: &str = "fck-nat";

/// Name of the SSM parameter created when no agent config is supplied. No
/// leading slash, so `parameter/<name>` is a well-formed ARN suffix.
pub const PARAMETER_NAME: &str = "fck-nat-cloudwatch-agent-config";

/// Interface names on AL2023 based images. The agent config needs them up
/// front, so images with a different naming scheme need their own config.
const INTERFACES: [&str; 2] = ["ens5", "ens6"];

pub fn default_cloudwatch_config() -> serde_json::Value {
    json!({
        "agent": {
            "metrics_collection_interval": 60,
            "run_as_user": "root",
            "usage_data": false,
        },
        "metrics": {
            "namespace": NAMESPACE,
            "metrics_collected": {
                "net": {
                    "resources": INTERFACES,
                    "measurement": [
                        { "name": "bytes_recv", "rename": "BytesIn", "unit": "Bytes" },
                        { "name": "bytes_sent", "rename": "BytesOut", "unit": "Bytes" },
                        { "name": "packets_sent", "rename": "PacketsOutCount", "unit": "Count" },
                        { "name": "packets_recv", "rename": "PacketsInCount", "unit": "Count" },
                        { "name": "drop_in", "rename": "PacketsDropInCount", "unit": "Count" },
                        { "name": "drop_out", "rename": "PacketsDropOutCount", "unit": "Count" },
                    ],
                },
                "netstat": {
                    "measurement": [
                        { "name": "tcp_syn_sent", "rename": "ConnectionAttemptOutCount", "unit": "Count" },
                        { "name": "tcp_syn_recv", "rename": "ConnectionAttemptInCount", "unit": "Count" },
                        { "name": "tcp_established", "rename": "ConnectionEstablishedCount", "unit": "Count" },
                    ],
                },
                "ethtool": {
                    "interface_include": INTERFACES,
                    "metrics_include": [
                        "bw_in_allowance_exceeded",
                        "bw_out_allowance_exceeded",
                        "conntrack_allowance_exceeded",
                        "pps_allowance_exceeded",
                    ],
                },
                "mem": {
                    "measurement": [
                        { "name": "used_percent", "rename": "MemoryUsed", "unit": "Percent" },
                    ],
                },
            },
            "append_dimensions": {
                "InstanceId": "${aws:InstanceId}",
                "AutoScalingGroupName": "${aws:AutoScalingGroupName}",
            },
        },
    })
}
