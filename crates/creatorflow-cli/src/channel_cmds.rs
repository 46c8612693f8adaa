//! CLI handlers for `creatorflow channel` and `creatorflow category`.

use anyhow::Result;

use creatorflow_core::state::AppState;

use crate::{CategoryCommands, ChannelCommands};

pub fn run_channel_command(command: ChannelCommands, state: &mut AppState) -> Result<()> {
    match command {
        ChannelCommands::List => cmd_list(state),
        ChannelCommands::Add { name } => {
            let name = state.add_channel(&name)?;
            println!("Added channel {name}.");
        }
        ChannelCommands::Rename { old, new } => {
            let new = state.rename_channel(&old, &new)?;
            println!("Renamed channel {old} to {new}.");
        }
        ChannelCommands::Delete { name } => {
            let removed = state.delete_channel(&name)?;
            println!("Deleted channel {}.", removed.name);
        }
        ChannelCommands::Target { name, target } => {
            state.set_channel_target(&name, target)?;
            println!("Channel {name} target set to {target}.");
        }
    }
    Ok(())
}

pub fn run_category_command(command: CategoryCommands, state: &mut AppState) -> Result<()> {
    match command {
        CategoryCommands::Add { channel, name } => {
            state.add_sub_category(&channel, &name)?;
            println!("Added {name} under {channel}.");
        }
        CategoryCommands::Rename { channel, old, new } => {
            state.rename_sub_category(&channel, &old, &new)?;
            println!("Renamed {old} to {new} under {channel}.");
        }
    }
    Ok(())
}

fn cmd_list(state: &AppState) {
    println!("{:<20} {:>6}  SUB-CATEGORIES", "CHANNEL", "TARGET");
    println!("{}", "-".repeat(70));
    for (name, channel) in state.channels() {
        let subs = state
            .categories()
            .get(name)
            .map(|subs| subs.join(", "))
            .unwrap_or_default();
        println!("{:<20} {:>6}  {}", name.as_str(), channel.target, subs);
    }
}
