//! The `hooks` subcommand: source an rc file, then fire events.

use std::{fmt::Write, path::Path, result, str::FromStr};

use hooks::{CommandInterpreter, CommandResult, HookType, Hooks, paths::expand_path};
use maildata::{AddressList, MailStore};
use tracing::info;

use crate::{cli::HooksArgs, error::Result, fixture::Fixture};

/// Something that happens in a mail session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// Program start.
    Startup,
    /// Program exit.
    Shutdown,
    /// The idle timer expired.
    Timeout,
    /// A mailbox was opened.
    Folder(String),
    /// An account was connected.
    Account(String),
    /// A message event: `message`, `send`, `send2` or `reply` on message N.
    Message(HookType, usize),
    /// Ask where message N would be saved.
    Save(usize),
    /// Ask where a copy of message N would be kept when sent.
    Fcc(usize),
    /// Ask where read mail from a mailbox is moved.
    Mbox(String),
    /// Ask which keys encrypt to an address.
    Crypt(String),
}

impl FromStr for Event {
    type Err = String;

    fn from_str(s: &str) -> result::Result<Self, Self::Err> {
        let (name, arg) = s.split_once(':').unwrap_or((s, ""));
        let number = || {
            arg.parse::<usize>()
                .map_err(|_| format!("{name}: expected a message number, got '{arg}'"))
        };
        let text = || {
            if arg.is_empty() {
                Err(format!("{name}: missing argument"))
            } else {
                Ok(arg.to_string())
            }
        };
        Ok(match name {
            "startup" => Self::Startup,
            "shutdown" => Self::Shutdown,
            "timeout" => Self::Timeout,
            "folder" => Self::Folder(text()?),
            "account" => Self::Account(text()?),
            "message" => Self::Message(HookType::MESSAGE, number()?),
            "send" => Self::Message(HookType::SEND, number()?),
            "send2" => Self::Message(HookType::SEND2, number()?),
            "reply" => Self::Message(HookType::REPLY, number()?),
            "save" => Self::Save(number()?),
            "fcc" => Self::Fcc(number()?),
            "mbox" => Self::Mbox(text()?),
            "crypt" => Self::Crypt(text()?),
            _ => return Err(format!("unknown event '{name}'")),
        })
    }
}

/// Records every command a hook asks the host to run.
#[derive(Debug, Default)]
pub struct Recorder {
    /// Commands in the order they ran.
    pub ran: Vec<String>,
}

impl CommandInterpreter for Recorder {
    fn exec(&mut self, line: &str, _source_dir: Option<&Path>) -> CommandResult {
        self.ran.push(line.to_string());
        CommandResult::Success
    }
}

/// Build the hook set for `fixture`, sourcing `rc` when given.
pub fn load(fixture: &Fixture, rc: Option<&Path>, interp: &mut Recorder) -> Result<Hooks> {
    let mut hooks = Hooks::new(fixture.hooks.clone(), fixture.clock());
    if let Some(path) = rc {
        let warnings = hooks.source_file(path, interp)?;
        info!(
            rc = %path.display(),
            hooks = hooks.registry().len(),
            warnings,
            "sourced hooks"
        );
    }
    Ok(hooks)
}

/// Run the `hooks` subcommand and return its report.
pub fn run(args: &HooksArgs) -> Result<String> {
    let fixture = Fixture::load_or_default(args.fixture.as_deref())?;
    let mut rec = Recorder::default();
    let mut hooks = load(&fixture, Some(&args.rc), &mut rec)?;
    let mut out = String::new();
    let _ignored = writeln!(
        out,
        "{}: {} hooks, {} other commands",
        args.rc.display(),
        hooks.registry().len(),
        rec.ran.len()
    );
    if args.list {
        for hook in hooks.registry().hooks() {
            let _ignored = writeln!(out, "  {hook}");
        }
    }
    for event in &args.events {
        let before = rec.ran.len();
        let answer = fire(&mut hooks, &fixture, event, &mut rec)?;
        let _ignored = writeln!(out, "{}", answer);
        for line in &rec.ran[before..] {
            let _ignored = writeln!(out, "  {line}");
        }
    }
    Ok(out)
}

/// Fire one event; returns the summary line.
fn fire(hooks: &mut Hooks, fixture: &Fixture, event: &Event, rec: &mut Recorder) -> Result<String> {
    let store: &dyn MailStore = &fixture.store;
    Ok(match event {
        Event::Startup => format!("startup: {} hooks", hooks.fire_startup(rec)),
        Event::Shutdown => format!("shutdown: {} hooks", hooks.fire_shutdown(rec)),
        Event::Timeout => format!("timeout: {} hooks", hooks.fire_timeout(rec)),
        Event::Folder(path) => {
            let full = expand_path(path, hooks.config());
            hooks.config_mut().current_folder = Some(full.clone());
            let n = hooks.fire_folder(Some(full.as_str()), None, rec)?;
            format!("folder {path}: {n} hooks")
        }
        Event::Account(url) => format!("account {url}: {} hooks", hooks.fire_account(url, rec)?),
        Event::Message(kind, n) => {
            let email = fixture.email(*n)?;
            let fired = hooks.fire_message(*kind, Some(store), email, rec)?;
            format!("{} {n}: {fired} hooks", kind.command_name())
        }
        Event::Save(n) => format!("save {n}: {}", hooks.default_save_path(Some(store), fixture.email(*n)?)),
        Event::Fcc(n) => format!("fcc {n}: {}", hooks.resolve_fcc_path(Some(store), fixture.email(*n)?)),
        Event::Mbox(path) => {
            let full = expand_path(path, hooks.config());
            let target = hooks.find_hook(HookType::MBOX, &full).unwrap_or("(none)");
            format!("mbox {path}: {target}")
        }
        Event::Crypt(addr) => {
            let list = AddressList::from(addr.as_str());
            let keys = list.first().map(|a| hooks.crypt_keys(a)).unwrap_or_default();
            format!("crypt {addr}: {}", keys.join(" "))
        }
    })
}

#[cfg(test)]
mod tests {
    use std::{env, fs, path::PathBuf, process};

    use super::*;

    /// A scratch directory unique to this test process and `name`.
    fn scratch(name: &str) -> PathBuf {
        let dir = env::temp_dir().join(format!("mailfmt-{}-{name}", process::id()));
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn events_parse() {
        assert_eq!("startup".parse::<Event>(), Ok(Event::Startup));
        assert_eq!("folder:=inbox".parse::<Event>(), Ok(Event::Folder("=inbox".into())));
        assert_eq!("send2:3".parse::<Event>(), Ok(Event::Message(HookType::SEND2, 3)));
        assert!("send:x".parse::<Event>().is_err());
        assert!("folder".parse::<Event>().is_err());
        assert_eq!("bogus:1".parse::<Event>(), Err("unknown event 'bogus'".to_string()));
    }

    #[test]
    fn report_lists_fired_commands() {
        let dir = scratch("report");
        let rc = dir.join("hooks.rc");
        fs::write(
            &rc,
            "set folder=/m\nfolder-hook =work 'set sort=threads'\n\
             save-hook '~f boss@corp' =boss\nmbox-hook =in =archive\nstartup-hook 'echo hi'\n",
        )
        .unwrap();
        let fixture = dir.join("f.ron");
        fs::write(
            &fixture,
            r#"(hooks: (folder: "/m"), store: (emails: [(envelope: (from: "boss@corp")), (envelope: (from: "al@x.org"))]))"#,
        )
        .unwrap();
        let args = HooksArgs {
            rc: rc.clone(),
            fixture: Some(fixture),
            events: ["startup", "startup", "folder:=work", "save:1", "save:2", "mbox:=in"]
                .iter()
                .map(|e| e.parse().unwrap())
                .collect(),
            list: false,
        };
        let out = run(&args).unwrap();
        let want = format!(
            "{}: 4 hooks, 1 other commands\n\
             startup: 1 hooks\n  echo hi\n\
             startup: 0 hooks\n\
             folder =work: 1 hooks\n  set sort=threads\n\
             save 1: /m/boss\n\
             save 2: =al\n\
             mbox =in: /m/archive\n",
            rc.display()
        );
        assert_eq!(out, want);
    }

    #[test]
    fn demo_files_load() {
        let demos = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../demos");
        let args = HooksArgs {
            rc: demos.join("hooks.rc"),
            fixture: Some(demos.join("inbox.ron")),
            events: ["folder:=work", "message:2", "send:3", "fcc:2", "crypt:carol@corp.example"]
                .iter()
                .map(|e| e.parse().unwrap())
                .collect(),
            list: true,
        };
        let out = run(&args).unwrap();
        assert!(out.contains("folder =work: 2 hooks\n  set sort=date\n  set sort=threads\n  push <first-entry>\n"));
        assert!(out.contains("message-hook 2: 1 hooks\n  set pager_index_lines=6\n"));
        assert!(out.contains("send-hook 3: 2 hooks\n"));
        assert!(out.contains("fcc 2: =lists/dev\n"));
        assert!(out.contains("crypt carol@corp.example: 0xC0FFEE\n"));
    }
}
