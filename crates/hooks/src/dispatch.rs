//! Running hooks when things happen.
//!
//! [`Hooks`] owns the registry, the charset tables and the settings the hook
//! commands read. The host feeds it command lines (from rc files or from
//! hook payloads) and events; anything that is not a hook command is handed
//! to the host's [`CommandInterpreter`].

use std::{fs, path::Path};

use expando::{
    Expando, RenderFlags,
    domain::{compress::CompressPaths, index::IndexData},
};
use maildata::{Address, Clock, Email, MailStore};
use pattern::PatternCache;
use tracing::{debug, error, trace, warn};

use crate::{
    charset::{CharsetLookup, LookupKind},
    config::HookConfig,
    error::{Error, Result},
    kind::{HookType, hook_type},
    parse::{self, Context, UnhookTarget},
    paths::{concat_path, expand_path, pretty_mailbox, safe_path},
    registry::{Hook, Registry},
    token::{Line, split_commands},
};

/// Outcome of running one command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandResult {
    /// The command worked.
    Success,
    /// The command did something questionable; carry on.
    Warning(String),
    /// The command failed.
    Error(String),
}

/// The host's command language.
pub trait CommandInterpreter {
    /// Run one command. `source_dir` is the directory of the file that
    /// defined it, for relative paths.
    fn exec(&mut self, line: &str, source_dir: Option<&Path>) -> CommandResult;
}

/// What happens when a hook's command fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OnError {
    /// Stop firing and report the failure.
    Abort,
    /// Log it and run the remaining hooks.
    Continue,
}

/// Hook registry plus dispatcher.
pub struct Hooks {
    /// Registered hooks.
    registry: Registry,
    /// `charset-hook` and `iconv-hook` mappings.
    charsets: CharsetLookup,
    /// Settings read by hook commands.
    config: HookConfig,
    /// Used for relative dates in selectors and formats.
    clock: Box<dyn Clock>,
    /// Types of the hooks currently executing, innermost last.
    running: Vec<HookType>,
    /// An account hook is executing.
    in_account: bool,
    /// Startup hooks have fired.
    started: bool,
    /// Shutdown hooks have fired.
    stopped: bool,
}

impl Hooks {
    /// No hooks yet.
    pub fn new(config: HookConfig, clock: Box<dyn Clock>) -> Self {
        Self {
            registry: Registry::new(),
            charsets: CharsetLookup::default(),
            config,
            clock,
            running: Vec::new(),
            in_account: false,
            started: false,
            stopped: false,
        }
    }

    /// The registered hooks.
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Current settings.
    pub fn config(&self) -> &HookConfig {
        &self.config
    }

    /// Change settings, e.g. the open folder.
    pub fn config_mut(&mut self) -> &mut HookConfig {
        &mut self.config
    }

    /// The clock selectors and formats are evaluated against.
    pub fn clock(&self) -> &dyn Clock {
        self.clock.as_ref()
    }

    /// Is `name` a command this type handles?
    pub fn is_hook_command(name: &str) -> bool {
        name.eq_ignore_ascii_case("unhook") || hook_type(name).is_some()
    }

    /// Run a hook command: `name` is the command word, `args` the rest of
    /// the line.
    pub fn command(&mut self, name: &str, args: &str, source_dir: Option<&Path>) -> Result<()> {
        if name.eq_ignore_ascii_case("unhook") {
            return self.unhook(args);
        }
        let kind = hook_type(name).ok_or_else(|| Error::Syntax(format!("{name}: unknown command")))?;
        let ctx = Context {
            config: &self.config,
            clock: self.clock.as_ref(),
            source_dir,
        };
        if kind.intersects(HookType::CHARSET | HookType::ICONV) {
            let (lookup, alias, charset) = parse::parse_charset_hook(kind, args)?;
            return self
                .charsets
                .add(lookup, &alias, &charset)
                .map_err(|e| Error::BadRegex {
                    regex: alias,
                    message: e.to_string(),
                });
        }
        if kind == HookType::INDEX_FORMAT {
            let (slot, hook) = parse::parse_index_format_hook(args, &ctx)?;
            let added = self.registry.add_index_format(&slot, hook);
            trace!(slot, ?added, "index-format-hook");
            return Ok(());
        }
        for hook in parse::parse_hook(kind, args, &ctx)? {
            let added = self.registry.add(hook);
            trace!(command = name, ?added, "hook registered");
        }
        Ok(())
    }

    /// Remove hooks. Refused for the type of a hook that is executing, and
    /// for `*` while any hook is executing. Nothing is removed unless every
    /// target is allowed.
    fn unhook(&mut self, args: &str) -> Result<()> {
        let targets = parse::parse_unhook(args)?;
        for target in &targets {
            match target {
                UnhookTarget::All if !self.running.is_empty() => return Err(Error::UnhookFromInsideHook),
                UnhookTarget::Kind(kind) if self.running.iter().any(|r| kind.contains(*r)) => {
                    return Err(Error::UnhookSameType(kind.command_name().to_string()));
                }
                _ => {}
            }
        }
        for target in targets {
            match target {
                UnhookTarget::All => {
                    self.registry.clear();
                    self.charsets.clear();
                }
                UnhookTarget::Kind(kind) if kind.intersects(HookType::CHARSET | HookType::ICONV) => {
                    self.charsets.clear();
                }
                UnhookTarget::Kind(kind) if kind == HookType::INDEX_FORMAT => self.registry.clear_index_formats(),
                UnhookTarget::Kind(kind) => {
                    let removed = self.registry.remove(kind);
                    debug!(hook = kind.command_name(), removed, "unhook");
                }
            }
        }
        Ok(())
    }

    /// Run one command line, which may hold several `;`-separated commands.
    /// Hook commands are handled here; everything else goes to `interp`.
    /// Stops at the first error.
    pub fn run_line(
        &mut self,
        line: &str,
        source_dir: Option<&Path>,
        interp: &mut dyn CommandInterpreter,
    ) -> CommandResult {
        let mut result = CommandResult::Success;
        for cmd in split_commands(line) {
            let mut words = Line::new(cmd);
            let name = match words.word(false) {
                Ok(name) => name,
                Err(msg) => return CommandResult::Error(msg),
            };
            let outcome = if Self::is_hook_command(&name) {
                match self.command(&name, words.rest(), source_dir) {
                    Ok(()) => CommandResult::Success,
                    Err(e) if e.is_warning() => CommandResult::Warning(e.to_string()),
                    Err(e) => CommandResult::Error(e.to_string()),
                }
            } else {
                interp.exec(cmd, source_dir)
            };
            match outcome {
                CommandResult::Success => {}
                CommandResult::Warning(_) => result = outcome,
                CommandResult::Error(_) => return outcome,
            }
        }
        result
    }

    /// Source the lines of an rc file. Warnings are logged and sourcing
    /// continues; the first error stops it and is reported with its file
    /// and line. Returns the number of warnings.
    pub fn source(
        &mut self,
        file: &str,
        text: &str,
        source_dir: Option<&Path>,
        interp: &mut dyn CommandInterpreter,
    ) -> Result<usize> {
        let mut warnings = 0;
        let mut lines = text.lines().enumerate();
        while let Some((n, first)) = lines.next() {
            // An unescaped trailing backslash continues the line.
            let mut line = first.to_string();
            while continues(&line)
                && let Some((_, next)) = lines.next()
            {
                line.pop();
                line.push_str(next);
            }
            match self.run_line(&line, source_dir, interp) {
                CommandResult::Success => {}
                CommandResult::Warning(msg) => {
                    warn!(file, line = n + 1, %msg, "rc warning");
                    warnings += 1;
                }
                CommandResult::Error(msg) => {
                    return Err(Error::At {
                        file: file.to_string(),
                        line: n + 1,
                        source: Box::new(Error::CommandFailed(msg)),
                    });
                }
            }
        }
        Ok(warnings)
    }

    /// Read and source an rc file.
    pub fn source_file(&mut self, path: &Path, interp: &mut dyn CommandInterpreter) -> Result<usize> {
        let text = fs::read_to_string(path).map_err(|e| Error::Read {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        let name = path.display().to_string();
        self.source(&name, &text, path.parent(), interp)
    }

    /// Run every hook of type `kind` that `select` accepts, in insertion
    /// order. Returns how many ran.
    fn fire(
        &mut self,
        kind: HookType,
        on_error: OnError,
        interp: &mut dyn CommandInterpreter,
        mut select: impl FnMut(&Self, &Hook) -> bool,
    ) -> Result<usize> {
        self.running.push(kind);
        let mut after = 0;
        let mut fired = 0;
        let mut result = Ok(());
        while let Some(hook) = self.registry.next(kind, after) {
            after = hook.serial;
            if !select(self, hook) {
                continue;
            }
            let command = hook.command.clone();
            let dir = hook.source_dir.clone();
            trace!(hook = kind.command_name(), %command, "running hook");
            fired += 1;
            match self.run_line(&command, dir.as_deref(), interp) {
                CommandResult::Success => {}
                CommandResult::Warning(msg) => warn!(hook = kind.command_name(), %msg, "hook warning"),
                CommandResult::Error(msg) => {
                    error!(hook = kind.command_name(), %msg, "hook command failed");
                    if on_error == OnError::Abort {
                        result = Err(Error::CommandFailed(msg));
                        break;
                    }
                }
            }
        }
        self.running.pop();
        result.map(|()| fired)
    }

    /// Entering a folder: run the folder hooks whose regex matches `path`,
    /// or failing that `desc`. Stops at the first failing command.
    pub fn fire_folder(
        &mut self,
        path: Option<&str>,
        desc: Option<&str>,
        interp: &mut dyn CommandInterpreter,
    ) -> Result<usize> {
        if path.is_none() && desc.is_none() {
            return Ok(0);
        }
        self.fire(HookType::FOLDER, OnError::Abort, interp, |_, hook| {
            let matched = [path, desc]
                .into_iter()
                .flatten()
                .find(|s| hook.matches_text(s));
            if let Some(m) = matched {
                debug!("folder-hook '{}' matches '{}'", hook.source, m);
            }
            matched.is_some()
        })
    }

    /// Connecting to an account. Hooks fired from inside an account hook's
    /// own commands are skipped.
    pub fn fire_account(&mut self, url: &str, interp: &mut dyn CommandInterpreter) -> Result<usize> {
        if self.in_account {
            debug!(url, "account-hook already running");
            return Ok(0);
        }
        self.in_account = true;
        let result = self.fire(HookType::ACCOUNT, OnError::Abort, interp, |_, hook| {
            let matched = hook.matches_text(url);
            if matched {
                debug!("account-hook '{}' matches '{}'", hook.source, url);
            }
            matched
        });
        self.in_account = false;
        result
    }

    /// Run the message, reply, send or send2 hooks that match `email`.
    /// Stops at the first failing command.
    pub fn fire_message(
        &mut self,
        kind: HookType,
        store: Option<&dyn MailStore>,
        email: &Email,
        interp: &mut dyn CommandInterpreter,
    ) -> Result<usize> {
        let mut cache = PatternCache::new();
        self.fire(kind, OnError::Abort, interp, |this, hook| {
            let matched = hook.matches_email(store, email, Some(&mut cache), this.clock());
            if matched {
                // The command about to run may change what the cache holds.
                cache.clear();
            }
            matched
        })
    }

    /// The idle timer fired. A failing hook does not stop the others.
    pub fn fire_timeout(&mut self, interp: &mut dyn CommandInterpreter) -> usize {
        self.fire(HookType::TIMEOUT | HookType::GLOBAL, OnError::Continue, interp, |_, _| true)
            .unwrap_or_default()
    }

    /// Program start. Runs at most once.
    pub fn fire_startup(&mut self, interp: &mut dyn CommandInterpreter) -> usize {
        if self.started {
            return 0;
        }
        self.started = true;
        self.fire(HookType::STARTUP | HookType::GLOBAL, OnError::Continue, interp, |_, _| true)
            .unwrap_or_default()
    }

    /// Program exit. Runs at most once.
    pub fn fire_shutdown(&mut self, interp: &mut dyn CommandInterpreter) -> usize {
        if self.stopped {
            return 0;
        }
        self.stopped = true;
        self.fire(HookType::SHUTDOWN | HookType::GLOBAL, OnError::Continue, interp, |_, _| true)
            .unwrap_or_default()
    }

    /// The format the first matching index-format hook of slot `name` gives
    /// for `email`.
    pub fn index_format(&self, name: &str, store: Option<&dyn MailStore>, email: &Email) -> Option<&Expando> {
        let mut cache = PatternCache::new();
        self.registry
            .index_formats(name)
            .iter()
            .find(|h| h.matches_email(store, email, Some(&mut cache), self.clock()))
            .and_then(|h| h.expando.as_ref())
    }

    /// Render slot `name` for `email`, for the `%@name@` index code.
    pub fn render_index_format(&self, name: &str, store: Option<&dyn MailStore>, email: &Email) -> Option<String> {
        let expando = self.index_format(name, store, email)?;
        let data = match store {
            Some(s) => IndexData::new(email).with_store(s),
            None => IndexData::new(email),
        };
        Some(expando.render_unbounded(&data, RenderFlags::empty(), self.clock()))
    }

    /// The payload of the first hook of type `kind` whose regex matches
    /// `candidate`: the mailbox of an mbox hook, the command of a compress
    /// hook.
    pub fn find_hook(&self, kind: HookType, candidate: &str) -> Option<&str> {
        self.registry
            .find_first(kind, candidate)
            .map(|h| h.command.as_str())
    }

    /// The compress command of type `kind` for the folder at `path`, with
    /// `%f` and `%t` filled in.
    pub fn compress_command(&self, kind: HookType, path: &str, from: &str, to: &str) -> Option<String> {
        let hook = self.registry.find_first(kind, path)?;
        let expando = hook.expando.as_ref()?;
        Some(expando.render_unbounded(&CompressPaths { from, to }, RenderFlags::PLAIN, self.clock()))
    }

    /// Key ids the crypt hooks give for `addr`.
    pub fn crypt_keys(&self, addr: &Address) -> Vec<String> {
        self.registry
            .list_matching(HookType::CRYPT, &addr.mailbox)
            .into_iter()
            .map(str::to_string)
            .collect()
    }

    /// The replacement name for charset `name`.
    pub fn lookup_charset(&self, kind: LookupKind, name: &str) -> Option<&str> {
        self.charsets.lookup(kind, name)
    }

    /// Render the mailbox of the first hook of type `kind` matching `email`.
    fn address_hook(&self, kind: HookType, store: Option<&dyn MailStore>, email: &Email) -> Option<String> {
        let mut cache = PatternCache::new();
        let hook = self
            .registry
            .hooks()
            .iter()
            .filter(|h| h.kind == kind)
            .find(|h| h.matches_email(store, email, Some(&mut cache), self.clock()))?;
        let expando = hook.expando.as_ref()?;
        let data = match store {
            Some(s) => IndexData::new(email).with_store(s),
            None => IndexData::new(email),
        };
        Some(expando.render_unbounded(&data, RenderFlags::PLAIN, self.clock()))
    }

    /// Where to save `email` by default: the first matching save hook, or a
    /// folder named after the correspondent.
    pub fn default_save_path(&self, store: Option<&dyn MailStore>, email: &Email) -> String {
        if let Some(path) = self.address_hook(HookType::SAVE, store, email) {
            return path;
        }
        let env = &email.envelope;
        let from = env.from.first();
        let from_me = from.is_some_and(|a| store.is_some_and(|s| s.is_user_address(a)));
        let named = |a: &&Address| !a.mailbox.is_empty();
        let correspondent = if from_me {
            None
        } else {
            env.reply_to.first().filter(named).or_else(|| from.filter(named))
        };
        let addr = correspondent
            .or_else(|| env.to.first().filter(named))
            .or_else(|| env.cc.first().filter(named));
        addr.map_or_else(String::new, |a| {
            format!("={}", safe_path(a, self.config.save_address))
        })
    }

    /// Where to keep a copy of outgoing `email`: the first matching fcc
    /// hook, else a folder named after the first recipient when `save_name`
    /// or `force_name` is set, else `record`.
    pub fn resolve_fcc_path(&self, store: Option<&dyn MailStore>, email: &Email) -> String {
        let cfg = &self.config;
        let record = || expand_path(&cfg.record, cfg);
        let path = self.address_hook(HookType::FCC, store, email).unwrap_or_else(|| {
            let env = &email.envelope;
            let recipient = env
                .to
                .first()
                .or_else(|| env.cc.first())
                .or_else(|| env.bcc.first());
            match recipient {
                Some(addr) if cfg.save_name || cfg.force_name => {
                    let folder = expand_path(&cfg.folder, cfg);
                    let path = concat_path(&folder, &safe_path(addr, cfg.save_address));
                    if cfg.force_name || Path::new(&path).exists() {
                        path
                    } else {
                        record()
                    }
                }
                _ => record(),
            }
        });
        pretty_mailbox(&path, cfg)
    }
}

/// Does `line` end in an odd number of backslashes?
fn continues(line: &str) -> bool {
    line.bytes().rev().take_while(|b| *b == b'\\').count() % 2 == 1
}
