use serde::{Deserialize, Serialize};

use crate::models::game::{Event, Game, Stage};
use crate::models::role::{Allegiance, RoleId};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", tag = "to", content = "name")]
pub enum Recipient {
    Everyone,
    Player(String),
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutboundMessage {
    pub recipient: Recipient,
    pub text: String,
}

fn broadcast(text: impl Into<String>) -> OutboundMessage {
    OutboundMessage {
        recipient: Recipient::Everyone,
        text: text.into(),
    }
}

fn whisper(name: &str, text: impl Into<String>) -> OutboundMessage {
    OutboundMessage {
        recipient: Recipient::Player(name.to_string()),
        text: text.into(),
    }
}

/// Turn a command's event trail into addressed messages. Night ability
/// results stay private to the acting player; everything else is public.
/// The exact wording is presentation, not rules.
pub fn render(game: &Game, events: &[Event]) -> Vec<OutboundMessage> {
    let mut out = Vec::new();
    for event in events {
        match event {
            Event::StageBegan(stage) => out.extend(stage_prompts(game, *stage)),
            Event::VoteCast { voter, target } => {
                out.push(broadcast(format!("{} votes against {}.", voter, target)));
            }
            Event::DevourVoteCast { voter, target } => {
                for wolf in game.wolf_voters() {
                    out.push(whisper(
                        &wolf.name,
                        format!("{} wants to devour {}.", voter, target),
                    ));
                }
            }
            Event::ServantChoice { servant, target } => {
                out.push(whisper(
                    servant,
                    format!(
                        "{} is about to be lynched. Reveal yourself to take their role, or pass.",
                        target
                    ),
                ));
            }
            Event::Devoured(name) => {
                out.push(broadcast(format!(
                    "At dawn the village finds {} devoured by the werewolves.",
                    name
                )));
            }
            Event::Healed => {
                out.push(broadcast(
                    "The werewolves' victim was saved during the night.",
                ));
            }
            Event::Protected(_) => {
                out.push(broadcast(
                    "The werewolves attacked, but their victim was under protection.",
                ));
            }
            Event::NoDevour => {
                out.push(broadcast("The night passes without a werewolf attack."));
            }
            Event::Poisoned(name) => {
                out.push(broadcast(format!(
                    "{} was found dead, poisoned during the night.",
                    name
                )));
            }
            Event::Lynched(name) => {
                out.push(broadcast(format!("The village has lynched {}.", name)));
            }
            Event::NoLynch => {
                out.push(broadcast("The vote is deadlocked; nobody is lynched today."));
            }
            Event::JesterRevealed(name) => {
                out.push(broadcast(format!(
                    "{} turns out to be the Jester and survives the lynch, but may no longer vote.",
                    name
                )));
            }
            Event::SeerResult { seer, target, role } => {
                out.push(whisper(seer, format!("{} is the {}.", target, role)));
            }
            Event::RoleAssumed { player, role } => {
                out.push(broadcast(format!(
                    "{} reveals themself as the Devoted Servant and assumes the role of {}.",
                    player, role
                )));
            }
            Event::AllegianceChanged { player, allegiance } => match allegiance {
                // Secret conversions go to the player alone.
                Allegiance::Werewolves => out.push(whisper(
                    player,
                    "You now serve the Werewolves.".to_string(),
                )),
                _ => out.push(whisper(
                    player,
                    format!("Your allegiance is now with the {}.", allegiance),
                )),
            },
            Event::GameEnded(winner) => {
                let text = match winner {
                    Some(allegiance) => format!("The game is over: the {} win!", allegiance),
                    None => "The game is over with no survivors and no winner.".to_string(),
                };
                out.push(broadcast(text));
            }
        }
    }
    out
}

fn stage_prompts(game: &Game, stage: Stage) -> Vec<OutboundMessage> {
    match stage {
        Stage::Sunset => vec![broadcast("Night falls over the village.")],
        Stage::Sunrise => vec![broadcast("The sun rises over the village.")],
        Stage::WolfHoundsTurn => prompt_role(
            game,
            RoleId::WolfHound,
            "Wolf-hound, choose your side: werewolves or villagers.",
        ),
        Stage::WildChildsTurn => prompt_role(
            game,
            RoleId::WildChild,
            "Wild-child, choose your role model.",
        ),
        Stage::SeersTurn => prompt_role(game, RoleId::Seer, "Seer, whose role do you wish to see?"),
        Stage::DefendersTurn => {
            prompt_role(game, RoleId::Defender, "Defender, who will you protect tonight?")
        }
        Stage::WerewolvesTurn => game
            .wolf_voters()
            .iter()
            .map(|wolf| whisper(&wolf.name, "Werewolves, vote for tonight's prey."))
            .collect(),
        Stage::WitchsTurn => {
            let text = match &game.night.devour {
                Some(victim) => format!(
                    "Witch, the werewolves chose {}. You may heal or poison.",
                    victim
                ),
                None => "Witch, the werewolves took no victim. You may still poison.".to_string(),
            };
            prompt_role_text(game, RoleId::Witch, text)
        }
        Stage::VillagesTurn => vec![broadcast(
            "The village gathers to vote for today's lynch.",
        )],
        Stage::ScapegoatsTurn => prompt_role(
            game,
            RoleId::Scapegoat,
            "Scapegoat, choose who may vote tomorrow, then pass.",
        ),
        Stage::GameOver => Vec::new(),
    }
}

fn prompt_role(game: &Game, role: RoleId, text: &str) -> Vec<OutboundMessage> {
    prompt_role_text(game, role, text.to_string())
}

fn prompt_role_text(game: &Game, role: RoleId, text: String) -> Vec<OutboundMessage> {
    game.players
        .iter()
        .filter(|p| p.alive && p.role == role)
        .map(|p| whisper(&p.name, text.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::player::Player;

    #[test]
    fn seer_results_are_private() {
        let game = Game::new(
            vec![
                Player::new("seer".to_string(), RoleId::Seer),
                Player::new("wolf".to_string(), RoleId::SimpleWerewolf),
            ],
            Stage::SeersTurn,
        );
        let events = [Event::SeerResult {
            seer: "seer".to_string(),
            target: "wolf".to_string(),
            role: RoleId::SimpleWerewolf,
        }];
        let messages = render(&game, &events);
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].recipient, Recipient::Player("seer".to_string()));
        assert!(messages[0].text.contains("Simple Werewolf"));
    }

    #[test]
    fn eliminations_are_broadcast() {
        let game = Game::new(
            vec![Player::new("ann".to_string(), RoleId::SimpleVillager)],
            Stage::Sunrise,
        );
        let messages = render(&game, &[Event::Devoured("ann".to_string())]);
        assert_eq!(messages[0].recipient, Recipient::Everyone);
    }

    #[test]
    fn wolf_prompts_reach_every_werewolf_voter() {
        let game = Game::new(
            vec![
                Player::new("wolf".to_string(), RoleId::SimpleWerewolf),
                Player::new("grey".to_string(), RoleId::SimpleWerewolf),
                Player::new("ann".to_string(), RoleId::SimpleVillager),
            ],
            Stage::WerewolvesTurn,
        );
        let messages = render(&game, &[Event::StageBegan(Stage::WerewolvesTurn)]);
        assert_eq!(messages.len(), 2);
        assert!(messages
            .iter()
            .all(|m| matches!(&m.recipient, Recipient::Player(_))));
    }
}
