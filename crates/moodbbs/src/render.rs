//! Terminal rendering for CLI output

use anyhow::Result;
use moodbbs_api::{
    MoodModifier, MoodSnapshot, MoodState, PersonalityTrait, Quest, QuestCompletion, QuestSnooze,
    QuestStats, QuestStatus,
};
use moodbbs_core::{CompletionResult, CoreEvent, UserStats};
use moodbbs_util::{format_date, format_datetime_full};
use serde::Serialize;

/// Chooses between human-readable text and pretty JSON
#[derive(Debug, Clone, Copy)]
pub struct Output {
    pub json: bool,
}

impl Output {
    pub fn show<T: Serialize + ?Sized>(&self, value: &T, human: impl FnOnce()) -> Result<()> {
        if self.json {
            println!("{}", serde_json::to_string_pretty(value)?);
        } else {
            human();
        }
        Ok(())
    }
}

pub fn quest_line(quest: &Quest, snooze: Option<&QuestSnooze>) -> String {
    let mut line = format!(
        "#{:<4} {:<40} {:<13} {:<10} {:>4} XP",
        quest.id,
        quest.title,
        quest.category.as_str(),
        quest.difficulty.as_str(),
        quest.xp_reward,
    );

    match quest.status {
        QuestStatus::Active => {}
        QuestStatus::Snoozed => {
            let until = snooze
                .map(|s| format_date(&s.return_at))
                .unwrap_or_else(|| "?".into());
            line.push_str(&format!("  [snoozed until {}]", until));
        }
        QuestStatus::PendingRenewal => {
            let at = quest
                .next_eligible_renewal
                .map(|t| format_date(&t))
                .unwrap_or_else(|| "?".into());
            line.push_str(&format!("  [renews {}]", at));
        }
        status => line.push_str(&format!("  [{}]", status)),
    }

    if let Some(constraint) = &quest.constraint {
        line.push_str(&format!("  ({}: {})", constraint.kind, constraint.note));
    }
    line
}

pub fn print_quest(quest: &Quest) {
    println!("{}", quest_line(quest, None));
    if !quest.description.is_empty() {
        println!("      {}", quest.description);
    }
    if let Some(location) = &quest.location {
        println!("      at {}", location);
    }
}

pub fn print_quests<'a>(quests: impl IntoIterator<Item = (&'a Quest, Option<&'a QuestSnooze>)>) {
    let mut any = false;
    for (quest, snooze) in quests {
        println!("{}", quest_line(quest, snooze));
        any = true;
    }
    if !any {
        println!("No quests.");
    }
}

pub fn print_completion(result: &CompletionResult) {
    println!(
        "Completed \"{}\" for {} XP (total {} XP)",
        result.quest.title, result.xp_awarded, result.total_xp
    );
    for buff in &result.buffs {
        println!("  {:+3} {}", buff.modifier, buff.event_type);
    }
    match result.quest.status {
        QuestStatus::PendingRenewal => {
            if let Some(at) = result.quest.next_eligible_renewal {
                println!("Renews {}", format_date(&at));
            }
        }
        QuestStatus::Hidden => println!("This quest will not come back."),
        _ => {}
    }
}

pub fn print_snooze(quest: &Quest, snooze: &QuestSnooze) {
    println!(
        "Snoozed \"{}\" until {} ({})",
        quest.title,
        format_date(&snooze.return_at),
        snooze.reason_category
    );
}

pub fn print_mood(mood: &MoodState) {
    println!("{}  {} ({:+})", mood.face, mood.tier, mood.score);
    for event in &mood.active_events {
        let expiry = event
            .expires_at
            .map(|t| format!("until {}", format_datetime_full(&t)))
            .unwrap_or_else(|| "permanent".into());
        println!(
            "  #{:<4} {:+3} {:<24} {}",
            event.id, event.modifier, event.event_type, expiry
        );
    }
    for personality_trait in &mood.active_traits {
        println!(
            "        {:+3} {:<24} trait",
            personality_trait.modifier, personality_trait.name
        );
    }
}

pub fn print_history(completions: &[QuestCompletion], title_of: impl Fn(&QuestCompletion) -> String) {
    if completions.is_empty() {
        println!("No completions in this window.");
        return;
    }
    for completion in completions {
        println!(
            "{}  {:<40} {:>4} XP",
            format_datetime_full(&completion.completed_at),
            title_of(completion),
            completion.xp_awarded
        );
        if let Some(notes) = &completion.notes {
            println!("                     {}", notes);
        }
    }
}

pub fn print_stats(stats: &QuestStats) {
    println!("Quests completed: {}", stats.total_completed);
    println!("Total XP:         {}", stats.total_xp);
    for (category, count) in &stats.by_category {
        println!("  {:<14} {}", category.as_str(), count);
    }
}

pub fn print_status(stats: &UserStats, store_healthy: bool) {
    println!("XP:            {}", stats.total_xp);
    println!("Completed:     {}", stats.quests_completed);
    println!("Active quests: {}", stats.active_quests);
    println!(
        "Mood:          {} {} ({:+})",
        stats.mood.face, stats.mood.tier, stats.mood.score
    );
    if !store_healthy {
        println!("Store:         UNHEALTHY");
    }
}

pub fn print_modifiers<'a>(modifiers: impl IntoIterator<Item = &'a MoodModifier>) {
    for modifier in modifiers {
        let duration = modifier
            .duration_hours
            .map(|h| format!("{}h", h))
            .unwrap_or_else(|| "-".into());
        println!(
            "{:<24} {:+3} {:>5}  {:<6} {}",
            modifier.event_type, modifier.default_value, duration, modifier.category, modifier.name
        );
    }
}

pub fn print_traits(traits: &[PersonalityTrait]) {
    if traits.is_empty() {
        println!("No traits.");
        return;
    }
    for personality_trait in traits {
        let state = if personality_trait.is_active { "" } else { " (inactive)" };
        println!(
            "{:<16} {:+3}  {}{}",
            personality_trait.name, personality_trait.modifier, personality_trait.description, state
        );
    }
}

pub fn print_snapshots(snapshots: &[MoodSnapshot]) {
    for snapshot in snapshots {
        println!(
            "#{:<4} {}  {} {} ({:+})",
            snapshot.id,
            format_datetime_full(&snapshot.created_at),
            snapshot.face,
            snapshot.tier,
            snapshot.score
        );
    }
}

pub fn print_events(events: &[CoreEvent]) {
    if events.is_empty() {
        println!("Nothing to do.");
        return;
    }
    for event in events {
        match event {
            CoreEvent::QuestRenewed { quest_id, renewal_count } => {
                println!("Quest #{} renewed (x{})", quest_id, renewal_count);
            }
            CoreEvent::QuestReturned { quest_id } => {
                println!("Quest #{} is back from snooze", quest_id);
            }
        }
    }
}
