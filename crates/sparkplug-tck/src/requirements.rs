//! Normative statements checked by the harness, keyed by their stable ids.

/// One checkable assertion: a stable id plus the statement text used as the
/// explanation when the check fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Requirement {
    pub id: &'static str,
    pub text: &'static str,
}

// Host application session termination

pub const HOST_DISCONNECT_INTENTIONAL: Requirement = Requirement {
    id: "operational-behavior-host-application-disconnect-intentional",
    text: "When a Host Application disconnects intentionally it MUST publish its death message before sending the MQTT DISCONNECT packet",
};

pub const HOST_DEATH_TOPIC: Requirement = Requirement {
    id: "operational-behavior-host-application-death-topic",
    text: "The Host Application death message MUST be published on the topic STATE/[host_application_id]",
};

pub const HOST_DEATH_PAYLOAD_PRESENT: Requirement = Requirement {
    id: "operational-behavior-host-application-death-payload-present",
    text: "The Host Application death message MUST include a payload",
};

pub const HOST_DEATH_PAYLOAD: Requirement = Requirement {
    id: "operational-behavior-host-application-death-payload",
    text: "The Host Application death message payload MUST be the UTF-8 string OFFLINE",
};

pub const HOST_DEATH_QOS: Requirement = Requirement {
    id: "operational-behavior-host-application-death-qos",
    text: "The Host Application death message MUST be published with MQTT QoS 1",
};

pub const HOST_DEATH_RETAINED: Requirement = Requirement {
    id: "operational-behavior-host-application-death-retained",
    text: "The Host Application death message MUST be published with the MQTT retain flag set",
};

// Session persistence, checked on every CONNECT

pub const CLEAN_SESSION_311: Requirement = Requirement {
    id: "principles-persistence-clean-session-311",
    text: "An MQTT 3.1.1 Sparkplug client MUST connect with the Clean Session flag set to true",
};

pub const CLEAN_SESSION_50: Requirement = Requirement {
    id: "principles-persistence-clean-session-50",
    text: "An MQTT 5.0 Sparkplug client MUST connect with Clean Start set to true and a Session Expiry Interval of 0",
};

// Traffic observed broker-wide

pub const TOPIC_STRUCTURE_NAMESPACE: Requirement = Requirement {
    id: "topic-structure-namespace",
    text: "Topics in the spBv1.0 namespace MUST be spBv1.0/group_id/message_type/edge_node_id[/device_id] with a valid message type",
};

pub const HOST_STATE_PAYLOAD: Requirement = Requirement {
    id: "host-state-payload",
    text: "A STATE message payload MUST be the UTF-8 string ONLINE or OFFLINE",
};
