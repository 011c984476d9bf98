pub mod replay_cmd;
pub mod scenarios_cmd;
