use super::ui;
use crate::core::{InputEvent, InputRouter};
use anyhow::{Result, anyhow};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::debug;

const HELP: &str = "\
Commands:
  m <amount>         edit the mithqals field
  $ <amount>         edit the money field
  metal <gold|silver>
  currency <CODE|CUSTOM>
  rate <value>       custom exchange rate (units per USD)
  show               print the form
  help               print this message
  quit";

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Input(InputEvent),
    Show,
    Help,
    Quit,
}

/// Parses one line typed at the prompt.
pub fn parse_command(line: &str) -> Result<Command> {
    let line = line.trim();
    let (verb, arg) = match line.split_once(char::is_whitespace) {
        Some((verb, arg)) => (verb, arg.trim()),
        None => (line, ""),
    };

    let command = match verb.to_lowercase().as_str() {
        "m" | "mithqals" => Command::Input(InputEvent::MithqalsEdited(arg.to_string())),
        "$" | "money" => Command::Input(InputEvent::MoneyEdited(arg.to_string())),
        "metal" => Command::Input(InputEvent::MetalSelected(arg.parse()?)),
        "currency" | "cur" => Command::Input(InputEvent::CurrencySelected(arg.parse()?)),
        "rate" => Command::Input(InputEvent::CustomRateEdited(arg.to_string())),
        "show" | "" => Command::Show,
        "help" | "?" => Command::Help,
        "quit" | "exit" | "q" => Command::Quit,
        other => return Err(anyhow!("Unknown command: {}", other)),
    };
    Ok(command)
}

/// Line-driven form. Each line becomes an input event; the form is printed
/// whenever it changes, including when a background conversion lands.
pub async fn run(router: InputRouter) -> Result<()> {
    println!("{}", ui::style_text(HELP, ui::StyleType::Subtle));
    println!("{}", ui::render_form(&router.session().snapshot()));

    let mut updates = router.session().subscribe();
    let printer = tokio::spawn(async move {
        while updates.changed().await.is_ok() {
            let form = updates.borrow_and_update().clone();
            println!("{}", ui::render_form(&form));
        }
    });

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        match parse_command(&line) {
            Ok(Command::Input(event)) => {
                if router.dispatch(event).is_some() {
                    debug!("Recalculation started");
                }
            }
            Ok(Command::Show) => println!("{}", ui::render_form(&router.session().snapshot())),
            Ok(Command::Help) => println!("{HELP}"),
            Ok(Command::Quit) => break,
            Err(e) => println!("{}", ui::style_text(&e.to_string(), ui::StyleType::Error)),
        }
    }

    printer.abort();
    Ok(())
}
