//! nom grammar for a single IRC line.
//!
//! ```text
//! [@tags] [:prefix] <command> [params...] [:trailing]
//! ```

use nom::{
    bytes::complete::{take_until, take_while1},
    character::complete::{char, space0},
    combinator::opt,
    error::ErrorKind,
    sequence::preceded,
    IResult,
};
use smallvec::SmallVec;

/// RFC 2812 parameter ceiling.
const MAX_PARAMS: usize = 15;

pub(crate) type Params<'a> = SmallVec<[&'a str; MAX_PARAMS]>;

fn parse_tags(input: &str) -> IResult<&str, &str> {
    preceded(char('@'), take_until(" "))(input)
}

fn parse_prefix(input: &str) -> IResult<&str, &str> {
    preceded(char(':'), take_while1(|c| c != ' '))(input)
}

/// command = 1*letter / 3digit
fn parse_command(input: &str) -> IResult<&str, &str> {
    let (rest, cmd) = take_while1(|c: char| c.is_ascii_alphanumeric())(input)?;

    let letters = cmd.chars().all(|c| c.is_ascii_alphabetic());
    let numeric = cmd.len() == 3 && cmd.chars().all(|c| c.is_ascii_digit());

    if letters || numeric {
        Ok((rest, cmd))
    } else {
        Err(nom::Err::Error(nom::error::Error::new(
            input,
            ErrorKind::AlphaNumeric,
        )))
    }
}

/// Split the parameter section. Runs of spaces count as one separator and
/// the `:`-prefixed trailing parameter swallows the rest of the line.
fn parse_params(input: &str) -> (&str, Params<'_>) {
    let mut params = Params::new();
    let mut rest = input;

    while rest.starts_with(' ') {
        if params.len() >= MAX_PARAMS {
            break;
        }

        rest = rest.trim_start_matches(' ');
        if rest.is_empty() {
            break;
        }

        if let Some(trailing) = rest.strip_prefix(':') {
            params.push(trailing);
            rest = "";
            break;
        }

        let end = rest.find(' ').unwrap_or(rest.len());
        params.push(&rest[..end]);
        rest = &rest[end..];
    }

    (rest, params)
}

pub(crate) struct ParsedLine<'a> {
    pub tags: Option<&'a str>,
    pub prefix: Option<&'a str>,
    pub command: &'a str,
    pub params: Params<'a>,
}

pub(crate) fn parse_line(input: &str) -> IResult<&str, ParsedLine<'_>> {
    let (input, tags) = opt(parse_tags)(input)?;
    let (input, _) = space0(input)?;
    let (input, prefix) = opt(parse_prefix)(input)?;
    let (input, _) = space0(input)?;
    let (input, command) = parse_command(input)?;
    let (rest, params) = parse_params(input);

    Ok((
        rest,
        ParsedLine {
            tags,
            prefix,
            command,
            params,
        },
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_prefix_command_and_trailing() {
        let (_, line) = parse_line(":nick!u@h PRIVMSG #chan :hello there").unwrap();
        assert_eq!(line.prefix, Some("nick!u@h"));
        assert_eq!(line.command, "PRIVMSG");
        assert_eq!(line.params.as_slice(), &["#chan", "hello there"]);
    }

    #[test]
    fn collapses_repeated_spaces() {
        let (_, line) = parse_line("MODE   bot   +i").unwrap();
        assert_eq!(line.params.as_slice(), &["bot", "+i"]);
    }

    #[test]
    fn accepts_numeric_commands() {
        let (_, line) = parse_line(":srv 903 bot :SASL authentication successful").unwrap();
        assert_eq!(line.command, "903");
    }

    #[test]
    fn rejects_mixed_command_token() {
        assert!(parse_line("PR1VMSG #a :b").is_err());
        assert!(parse_line("9001 x").is_err());
    }

    #[test]
    fn tags_are_split_off() {
        let (_, line) = parse_line("@time=now;msgid=1 :a PING :x").unwrap();
        assert_eq!(line.tags, Some("time=now;msgid=1"));
        assert_eq!(line.command, "PING");
    }

    #[test]
    fn empty_trailing_is_kept() {
        let (_, line) = parse_line("CAP * LS :").unwrap();
        assert_eq!(line.params.as_slice(), &["*", "LS", ""]);
    }
}
