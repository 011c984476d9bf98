use clap::Args;
use sparkplug_tck::ScenarioRegistry;

#[derive(Args)]
pub struct ScenariosCommand {
    /// Only list scenarios of this profile
    #[arg(long, short)]
    pub profile: Option<String>,
}

pub fn execute(cmd: &ScenariosCommand) {
    let registry = ScenarioRegistry::builtin();
    for (profile, name) in registry.names() {
        if cmd.profile.as_deref().is_some_and(|p| p != profile) {
            continue;
        }
        println!("{profile} {name}");
    }
}
