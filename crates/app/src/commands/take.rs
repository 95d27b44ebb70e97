//! The `quiz take` command: an interactive session on stdin/stdout.

use std::time::Duration;

use anyhow::{Result, anyhow, bail};
use quiz_core::model::{HighlightTarget, PracticeTestSettings, TopicId, UserProfile};
use services::{AppServices, ResumeChoice, ReviewPanel, SaveStatus, Ticker};
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tracing::{debug, warn};
use ui::ViewError;
use ui::vm::{
    OpenQuiz, ReviewIntent, SessionIntent, SessionOutcome, SessionVm, apply_review_intent,
    format_timer, mark_first, open_quiz, resolve_resume, review_grid,
};

const HELP: &str = "\
  a <label>   answer with option <label>
  x <label>   cross off option <label> (again to restore)
  m           mark or unmark for review
  n / p       next / previous question
  g <n>       go to question <n>
  s / e / h   toggle solution / explanation / exhibit
  hl <text>   highlight <text> in the question
  r           open the review panel
  f           finish the attempt
  q           save and quit";

const REVIEW_HELP: &str = "\
  j <n>       jump to question <n>
  all         review from the first question
  marked      jump to the first marked question
  incomplete  jump to the first unanswered question
  f           finish now
  c           close the panel";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Mode {
    Question,
    Review,
}

enum Step {
    Continue,
    Quit,
    Finished,
}

fn view_err(err: ViewError) -> anyhow::Error {
    anyhow!(err.message())
}

type StdinLines = Lines<BufReader<Stdin>>;

async fn read_line(lines: &mut StdinLines) -> Result<Option<String>> {
    Ok(lines.next_line().await?.map(|line| line.trim().to_string()))
}

pub async fn execute(
    services: &AppServices,
    topic: &str,
    item: &str,
    profile: Option<&UserProfile>,
    settings: PracticeTestSettings,
) -> Result<()> {
    let structure = super::load_topic(services, topic).await?;
    let Some(list_item) = super::find_item(&structure, item) else {
        bail!("{item} is not listed under {topic}");
    };
    let app_settings = services.app_settings().load_or_default().await;
    let sessions = services.sessions();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    let opened = open_quiz(
        &sessions,
        &TopicId::new(topic),
        &list_item.id,
        list_item.section_type,
        profile,
        settings,
    )
    .await
    .map_err(view_err)?;

    let mut vm = match opened {
        OpenQuiz::Upgrade(modal) => {
            println!("{}\n{}", modal.title, modal.message);
            for feature in modal.features {
                println!("  - {feature}");
            }
            return Ok(());
        }
        OpenQuiz::Session { vm, load_degraded } => {
            if load_degraded {
                println!("Your previous progress could not be loaded; starting fresh.");
            }
            vm
        }
        OpenQuiz::Resume { modal, prompt } => {
            println!("{}\n{}\n{}: {}", modal.title, modal.subtitle, modal.quiz_name, modal.progress_label);
            let choice = loop {
                println!("[r] {}  [s] {}", modal.buttons[1].label, modal.buttons[0].label);
                match read_line(&mut lines).await?.as_deref() {
                    Some("r") => break ResumeChoice::Resume,
                    Some("s") => break ResumeChoice::StartOver,
                    Some(_) => {}
                    None => return Ok(()),
                }
            };
            resolve_resume(&sessions, prompt, choice)
                .await
                .map_err(view_err)?
        }
    };

    println!("{}\n{HELP}\n", vm.title());
    render_question(&vm);

    let (ticker, mut ticks) = Ticker::spawn(Duration::from_secs(1));
    let mut heartbeat =
        tokio::time::interval(Duration::from_secs(app_settings.autosave_interval_secs().into()));
    heartbeat.tick().await;
    let mut mode = Mode::Question;

    loop {
        tokio::select! {
            Some(secs) = ticks.recv() => {
                if let SessionOutcome::Finished { timed_out: true } = vm.tick(secs).map_err(view_err)? {
                    println!("\nTime is up.");
                    break;
                }
            }
            _ = heartbeat.tick() => {
                if let Err(err) = vm.engine_mut().checkpoint() {
                    debug!(error = %err, "checkpoint skipped");
                }
            }
            line = read_line(&mut lines) => {
                let Some(line) = line? else {
                    break;
                };
                match handle_line(&mut vm, &mut mode, &line) {
                    Step::Continue => match mode {
                        Mode::Question => render_question(&vm),
                        Mode::Review => render_review(&mut vm),
                    },
                    Step::Quit | Step::Finished => break,
                }
            }
        }
    }
    ticker.stop();

    if vm.is_finished() {
        match vm.score_label() {
            Some(label) => println!("{label}"),
            None => warn!(quiz_id = %vm.engine().content().id, "could not grade attempt"),
        }
    } else {
        println!("Progress saved. Run the same command to resume.");
    }
    let engine = vm.into_engine();
    if let Some(state) = engine.close().await {
        if state.status == SaveStatus::Failed {
            warn!(error = ?state.last_error, "the last snapshot could not be saved");
        }
    }
    Ok(())
}

fn handle_line(vm: &mut SessionVm, mode: &mut Mode, line: &str) -> Step {
    let (cmd, arg) = match line.split_once(' ') {
        Some((cmd, arg)) => (cmd, arg.trim()),
        None => (line, ""),
    };

    if *mode == Mode::Review {
        let intent = match (cmd, arg) {
            ("j", n) => match parse_number(n) {
                Some(index) => ReviewIntent::Jump(index),
                None => {
                    println!("Usage: j <question number>");
                    return Step::Continue;
                }
            },
            ("all", _) => ReviewIntent::ReviewAll,
            ("marked", _) => ReviewIntent::ReviewMarked,
            ("incomplete", _) => ReviewIntent::ReviewIncomplete,
            ("f", _) => ReviewIntent::FinishNow,
            ("c", _) => ReviewIntent::Close,
            _ => {
                println!("{REVIEW_HELP}");
                return Step::Continue;
            }
        };
        let panel = match ReviewPanel::open(vm.engine_mut()) {
            Ok(panel) => panel,
            Err(err) => {
                println!("{err}");
                return Step::Continue;
            }
        };
        return match apply_review_intent(panel, intent) {
            Ok(services::sessions::ReviewDismissal::Finished) => Step::Finished,
            Ok(_) => {
                *mode = Mode::Question;
                Step::Continue
            }
            Err((_panel, message)) => {
                println!("{message}");
                Step::Continue
            }
        };
    }

    let intent = match (cmd, arg) {
        ("a", label) if !label.is_empty() => SessionIntent::Select(label.to_string()),
        ("x", label) if !label.is_empty() => SessionIntent::CrossOff(label.to_string()),
        ("m", _) => SessionIntent::ToggleMark,
        ("n", _) => SessionIntent::Next,
        ("p", _) => SessionIntent::Previous,
        ("g", n) => match parse_number(n) {
            Some(index) => SessionIntent::GoTo(index),
            None => {
                println!("Usage: g <question number>");
                return Step::Continue;
            }
        },
        ("s", _) => SessionIntent::ToggleSolution,
        ("e", _) => SessionIntent::ToggleExplanation,
        ("h", _) => SessionIntent::ToggleExhibit,
        ("hl", text) if !text.is_empty() => {
            let target = HighlightTarget::Prompt(vm.engine().current_index());
            match vm.display_html(&target).and_then(|html| mark_first(html, text)) {
                Some(html) => SessionIntent::Highlight { target, html },
                None => {
                    println!("\"{text}\" does not appear in the question.");
                    return Step::Continue;
                }
            }
        }
        ("f", _) => SessionIntent::Finish,
        ("q", _) => return Step::Quit,
        ("r", _) => {
            if let Err(err) = vm.engine_mut().pause_question_clock() {
                println!("{err}");
                return Step::Continue;
            }
            *mode = Mode::Review;
            return Step::Continue;
        }
        _ => {
            println!("{HELP}");
            return Step::Continue;
        }
    };

    match vm.apply(intent) {
        Ok(SessionOutcome::Finished { .. }) => Step::Finished,
        Ok(SessionOutcome::Continue) => Step::Continue,
        Err(err) => {
            println!("{}", err.message());
            Step::Continue
        }
    }
}

/// 1-based question number to index.
fn parse_number(raw: &str) -> Option<usize> {
    raw.parse::<usize>().ok()?.checked_sub(1)
}

fn render_question(vm: &SessionVm) {
    let q = vm.current_question();
    let mut status = vec![vm.timer_label()];
    if let Some(hint) = vm.save_indicator() {
        status.push(hint.to_string());
    }
    if q.marked {
        status.push("marked".to_string());
    }
    println!("\n{}  [{}]", q.header, status.join(" | "));

    if let Some(error) = &q.load_error {
        println!("This question could not be loaded ({error}).");
        return;
    }
    if let Some(exhibit) = &q.exhibit {
        println!("--- exhibit ---\n{exhibit}---------------");
    }
    print!("{}", q.prompt);
    for option in &q.options {
        let selected = if option.selected { '>' } else { ' ' };
        let verdict = if option.correct == Some(true) { " (correct)" } else { "" };
        if option.crossed_off {
            println!(" {selected} {}. ~{}~{verdict}", option.label, option.text);
        } else {
            println!(" {selected} {}. {}{verdict}", option.label, option.text);
        }
    }
    if let Some(explanation) = &q.explanation {
        println!("--- explanation ---\n{explanation}");
    }
}

fn render_review(vm: &mut SessionVm) {
    let timer = format_timer(vm.engine().timer().value_secs());
    let panel = match ReviewPanel::open(vm.engine_mut()) {
        Ok(panel) => panel,
        Err(err) => {
            println!("{err}");
            return;
        }
    };
    let grid = review_grid(&panel);
    println!("\nReview  [{timer}]  {}", grid.summary_label);
    let cells: Vec<String> = grid
        .cells
        .iter()
        .map(|cell| {
            let state = match (cell.answered, cell.marked) {
                (true, true) => "A*",
                (true, false) => "A ",
                (false, true) => " *",
                (false, false) => "  ",
            };
            let current = if cell.is_current { '<' } else { ' ' };
            format!("{:>3}[{state}]{current}", cell.label)
        })
        .collect();
    for chunk in cells.chunks(10) {
        println!("{}", chunk.join(" "));
    }
    if let Some(error) = grid.error_label {
        println!("{error}");
    }
    println!("(A = answered, * = marked, < = current)");
}
