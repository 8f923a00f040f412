//! The `message-id` subcommand.

use expando::{
    Expando,
    domain::msgid::{MSGID_FORMAT, generate_message_id},
};
use rand::thread_rng;

use crate::{
    cli::MessageIdArgs,
    error::{Error, Result},
    fixture::Fixture,
};

/// Run the `message-id` subcommand: one id per line.
pub fn run(args: &MessageIdArgs) -> Result<String> {
    let fixture = Fixture::load_or_default(args.fixture.as_deref())?;
    let format = args
        .format
        .as_deref()
        .map(|f| Expando::parse(f, MSGID_FORMAT).map_err(|e| Error::format(&e, f)))
        .transpose()?;
    let hostname = fixture.hostname.as_deref().unwrap_or(&args.hostname);
    let clock = fixture.clock();
    let mut rng = thread_rng();
    let mut out = String::new();
    for _ in 0..args.count {
        out.push_str(&generate_message_id(format.as_ref(), clock.as_ref(), &mut rng, hostname));
        out.push('\n');
    }
    Ok(out)
}
