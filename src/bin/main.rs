use crossterm::cursor::MoveTo;
use crossterm::execute;
use crossterm::style::Stylize;
use crossterm::terminal::{Clear, ClearType};
use starnet_core::config::StarConfig;
use starnet_core::mission::{Advance, SlotStatus};
use starnet_core::StarEngine;
use std::io::{stdin, stdout, Write};
use std::path::Path;
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let config = StarConfig::load();
    let mut engine = StarEngine::from_config(&config)?;
    let mut page = 0usize;
    let mut status = String::from("Type 'help' for commands.");

    loop {
        print_ui(&engine, page, &status)?;

        let mut input = String::new();
        if stdin().read_line(&mut input)? == 0 {
            break;
        }
        let cmd = input.trim();
        let (head, rest) = cmd.split_once(' ').unwrap_or((cmd, ""));
        let rest = rest.trim();

        status = match head {
            "exit" | "quit" => break,
            "help" => HELP.to_string(),
            "map" => {
                let total = engine.constellations().len();
                page = match rest.parse::<usize>() {
                    Ok(n) if n > 0 => (n - 1).min(total.saturating_sub(1)),
                    _ => (page + 1) % total.max(1),
                };
                String::new()
            }
            "find" => match engine.constellations().iter().position(|c| c.contains(rest)) {
                Some(pos) => {
                    page = pos;
                    format!("'{rest}' is in constellation {}", pos + 1)
                }
                None => format!("'{rest}' is not on the map"),
            },
            "markmode" => format!("Marking mode {}", if engine.toggle_marking_mode() { "on" } else { "off" }),
            "click" => {
                engine.click_star(rest);
                format!("Clicked '{rest}'")
            }
            "mark" => {
                engine.toggle_mark(rest);
                format!("'{rest}' marked: {}", engine.star_state(rest).marked)
            }
            "notebook" => notebook(&engine),
            "search" => search(&engine, rest),
            "mission" => {
                if engine.start_mission(rest) {
                    format!("Mission started for '{rest}'")
                } else {
                    format!("'{rest}' is not in the vocabulary")
                }
            }
            "session" => {
                let n = rest.parse::<usize>().ok();
                format!("Session with {} questions", engine.start_session(n))
            }
            "a" | "answer" => match parse_slot(rest) {
                Some((slot, text)) => match engine.submit_answer(slot, text) {
                    Ok(SlotStatus::Correct) => "Correct!".to_string(),
                    Ok(SlotStatus::Empty) => "Slot cleared".to_string(),
                    Ok(_) => "Not quite".to_string(),
                    Err(e) => e.to_string(),
                },
                None => "Usage: answer <slot> <text>".to_string(),
            },
            "idk" => match parse_slot(rest) {
                Some((slot, _)) => match engine.mark_dont_know(slot) {
                    Ok(answer) => format!("The answer was '{answer}'"),
                    Err(e) => e.to_string(),
                },
                None => "Usage: idk <slot>".to_string(),
            },
            "hint" => match (parse_slot(rest), engine.mission()) {
                (Some((slot, more)), Some(mission)) => mission
                    .hint(slot, more == "more")
                    .unwrap_or_else(|e| e.to_string()),
                _ => "Usage: hint <slot> [more]".to_string(),
            },
            "done" => match engine.complete_mission() {
                Ok(outcome) => format!(
                    "{}/{} correct ({:.0}%){}",
                    outcome.correct_slots,
                    outcome.total_slots,
                    outcome.accuracy * 100.0,
                    if outcome.counted_correct { " - star restored!" } else { "" }
                ),
                Err(e) => e.to_string(),
            },
            "skip" => match engine.skip_mission() {
                Ok(skipped) => {
                    let mut msg = if skipped.flagged.is_empty() {
                        "Skipped".to_string()
                    } else {
                        format!("Skipped, marked for review: {}", skipped.flagged.join(", "))
                    };
                    if let Some(Advance::SessionComplete(stats)) = skipped.advance {
                        msg.push_str(&format!(
                            "\nSession complete: {}/{} correct",
                            stats.correct_answers, stats.total_questions
                        ));
                    }
                    msg
                }
                Err(e) => e.to_string(),
            },
            "next" => match engine.next_mission() {
                Ok(Advance::Next) => "Next question".to_string(),
                Ok(Advance::SessionComplete(stats)) => format!(
                    "Session complete: {}/{} correct",
                    stats.correct_answers, stats.total_questions
                ),
                Err(e) => e.to_string(),
            },
            "end" => match engine.end_session_early() {
                Some(stats) => format!("Session ended: {}/{} correct", stats.correct_answers, stats.total_questions),
                None => "Mission cleared".to_string(),
            },
            "clear" => {
                engine.clear_mission();
                "Mission cleared".to_string()
            }
            "export" => {
                let dir = if rest.is_empty() { "." } else { rest };
                match engine.export_to_dir(Path::new(dir)) {
                    Ok(path) => format!("Exported to {}", path.display()),
                    Err(e) => format!("Export failed: {e}"),
                }
            }
            "import" => match std::fs::read_to_string(rest) {
                Ok(blob) if engine.import_progress(&blob) => "Progress imported".to_string(),
                Ok(_) => "That file is not a progress export".to_string(),
                Err(e) => format!("Could not read '{rest}': {e}"),
            },
            "reset" => {
                engine.reset_progress();
                "All progress reset".to_string()
            }
            "" => String::new(),
            other => format!("Unknown command '{other}'"),
        };
    }

    println!("\nSaving progress...");
    if let Err(e) = engine.save() {
        eprintln!("[ERROR] Could not save progress: {}", e);
    } else {
        println!("Progress saved to '{}'", config.progress_path().display());
    }
    Ok(())
}

const HELP: &str = "map [n] | find <word> | markmode | click <word> | mark <word> | notebook | search <term>\n\
mission <word> | session [n] | answer <slot> <text> | idk <slot> | hint <slot> [more]\n\
done | skip | next | end | clear | export [dir] | import <file> | reset | exit";

/// `"2 some text"` -> slot index 1 and `"some text"`. Slots are 1-based on screen.
fn parse_slot(args: &str) -> Option<(usize, &str)> {
    let (slot, text) = args.split_once(' ').unwrap_or((args, ""));
    let n = slot.parse::<usize>().ok()?;
    Some((n.checked_sub(1)?, text.trim()))
}

fn notebook(engine: &StarEngine) -> String {
    let entries = engine.notebook();
    if entries.is_empty() {
        return "Notebook is empty".to_string();
    }
    entries
        .iter()
        .map(|(word, entry)| {
            let state = engine.star_state(word);
            let practice = format!(
                "{}/{} correct ({:.0}%)",
                state.correct,
                state.attempts,
                state.accuracy() * 100.0
            );
            match entry {
                Some(e) => format!("  {word}: {} [{}] - {practice}", e.meaning, e.synonyms.join(", ")),
                None => format!("  {word} - {practice}"),
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn search(engine: &StarEngine, term: &str) -> String {
    let hits = engine.search(term);
    let shown: Vec<String> = hits.iter().take(20).map(|e| format!("  {}: {}", e.word, e.meaning)).collect();
    let more = hits.len().saturating_sub(shown.len());
    let mut out = shown.join("\n");
    if more > 0 {
        out.push_str(&format!("\n  ... and {more} more"));
    }
    if out.is_empty() {
        out = format!("No words match '{term}'");
    }
    out
}

fn print_ui(engine: &StarEngine, page: usize, status: &str) -> std::io::Result<()> {
    let mut out = stdout();
    execute!(out, Clear(ClearType::All), MoveTo(0, 0))?;
    println!("{}", "GRE StarNet".bold().yellow());
    println!("---------------------------------------------------------------");

    let constellations = engine.constellations();
    if let Some(c) = constellations.get(page) {
        println!(
            "Constellation {}/{}: {} ({}) - {} stars, {} links",
            page + 1,
            constellations.len(),
            c.main_star.word.as_str().bold(),
            c.main_star.meaning,
            c.stars.len(),
            c.edges.len()
        );
        for star in &c.stars {
            let state = engine.star_state(&star.word);
            let filled = (state.brightness * 10.0).round() as usize;
            let bar = format!("{}{}", "*".repeat(filled), ".".repeat(10 - filled.min(10)));
            let name = if state.marked { star.word.as_str().red() } else { star.word.as_str().white() };
            let selected = if engine.selected_star() == Some(star.word.as_str()) { " <" } else { "" };
            println!("  [{bar}] {name}{selected}");
        }
    } else {
        println!("The sky is empty.");
    }
    if engine.is_marking_mode() {
        println!("{}", "(marking mode)".red());
    }

    if let Some(mission) = engine.mission() {
        println!("\n{} {} - {}", "Mission:".bold().cyan(), mission.word, mission.meaning);
        if let Some(session) = engine.session() {
            println!("  question {}/{}", session.index + 1, session.queue.len());
        }
        for (i, slot) in mission.slots.iter().enumerate() {
            let shown = match slot.status {
                SlotStatus::Empty => "____".to_string().dark_grey(),
                SlotStatus::Correct => slot.input.clone().green(),
                SlotStatus::Incorrect => slot.input.clone().red(),
                SlotStatus::DontKnow => format!("{} (revealed)", slot.target).yellow(),
            };
            println!("  {}: {shown}", i + 1);
        }
        if mission.completed {
            println!("  {}", "completed".green());
        }
    } else if let Some(stats) = engine.finished_session() {
        println!("\n{}", "Session finished".bold().green());
        println!("  {}/{} correct", stats.correct_answers, stats.total_questions);
        if !stats.missed_words.is_empty() {
            println!("  missed: {}", stats.missed_words.join(", "));
        }
        if !stats.dont_know_words.is_empty() {
            println!("  gave up on: {}", stats.dont_know_words.join(", "));
        }
    }

    if !status.is_empty() {
        println!("\n{status}");
    }
    print!("\n> ");
    out.flush()
}
