//! Session machine core: construction, entry points and keep-alive.

use super::{Action, Phase, SessionConfig, TerminalReason, MAX_UNANSWERED_PINGS};
use crate::event::InboundEvent;

/// Drives one connection attempt from dial to terminal.
///
/// The machine never touches a socket. Call [`start`](Self::start) once the
/// stream is open, [`handle`](Self::handle) for every classified inbound
/// line, and [`on_read_timeout`](Self::on_read_timeout) when a read deadline
/// expires. Each returns the actions to perform, in order.
#[derive(Debug)]
pub struct SessionMachine {
    pub(super) config: SessionConfig,
    pub(super) phase: Phase,
    pub(super) nick: String,
    pub(super) auth_sent: bool,
    pub(super) registration_sent: bool,
    /// 001 seen while still waiting for our own MODE line.
    pub(super) welcomed: bool,
    unanswered_pings: u8,
}

impl SessionMachine {
    /// New machine in [`Phase::Dialing`].
    pub fn new(config: SessionConfig) -> Self {
        let nick = config.nickname.clone();
        Self {
            config,
            phase: Phase::Dialing,
            nick,
            auth_sent: false,
            registration_sent: false,
            welcomed: false,
            unanswered_pings: 0,
        }
    }

    /// Current phase.
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Nickname currently requested or held.
    pub fn nick(&self) -> &str {
        &self.nick
    }

    /// Session configuration.
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// True once the machine has stopped.
    pub fn is_terminal(&self) -> bool {
        self.phase == Phase::Terminal
    }

    /// The stream is open: request SASL or go straight to registration.
    pub fn start(&mut self) -> Vec<Action> {
        if self.phase != Phase::Dialing {
            return Vec::new();
        }
        if self.config.sasl.is_some() {
            self.phase = Phase::CapNegotiating;
            vec![Action::Send("CAP REQ :sasl".to_string())]
        } else {
            let mut actions = Vec::new();
            self.register(&mut actions);
            actions
        }
    }

    /// React to one inbound event.
    pub fn handle(&mut self, event: &InboundEvent<'_>) -> Vec<Action> {
        let mut actions = Vec::new();
        if self.is_terminal() {
            return actions;
        }

        match event {
            InboundEvent::Ping { token } => {
                actions.push(Action::Send(pong_for(*token)));
                return actions;
            }
            InboundEvent::ServerError { reason } => {
                self.terminate(&mut actions, TerminalReason::ServerError(reason.to_string()));
                return actions;
            }
            _ => {}
        }

        match self.phase {
            Phase::CapNegotiating => self.on_cap(event, &mut actions),
            Phase::Authenticating => self.on_auth(event, &mut actions),
            Phase::Registering => self.on_registration(event, &mut actions),
            Phase::Dialing | Phase::Joining | Phase::SteadyState | Phase::Terminal => {}
        }
        actions
    }

    /// Any inbound line arrived; the peer is alive.
    pub fn on_activity(&mut self) {
        self.unanswered_pings = 0;
    }

    /// A read deadline expired with no inbound line.
    ///
    /// The first expiry sends a PING; a second one in a row ends the session.
    /// A server that welcomed us but never sent our MODE line is treated as
    /// registered instead.
    pub fn on_read_timeout(&mut self) -> Vec<Action> {
        let mut actions = Vec::new();
        if self.is_terminal() {
            return actions;
        }
        if self.phase == Phase::Registering && self.welcomed {
            self.join(&mut actions);
            return actions;
        }
        self.unanswered_pings = self.unanswered_pings.saturating_add(1);
        if self.unanswered_pings >= MAX_UNANSWERED_PINGS {
            self.terminate(
                &mut actions,
                TerminalReason::KeepaliveTimeout(self.unanswered_pings),
            );
        } else {
            actions.push(Action::Send(format!("PING :{}", self.config.ping_token)));
        }
        actions
    }

    pub(super) fn terminate(&mut self, actions: &mut Vec<Action>, reason: TerminalReason) {
        self.phase = Phase::Terminal;
        actions.push(Action::Terminate(reason));
    }
}

fn pong_for(token: Option<&str>) -> String {
    match token {
        Some(token) => format!("PONG :{token}"),
        None => "PONG".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::MessageRef;
    use crate::state::SaslCredentials;

    fn feed(machine: &mut SessionMachine, line: &str) -> Vec<Action> {
        let msg = MessageRef::parse(line).unwrap();
        let nick = machine.nick().to_string();
        machine.on_activity();
        machine.handle(&InboundEvent::classify(&msg, &nick))
    }

    fn sasl_config() -> SessionConfig {
        let mut config = SessionConfig::new("skuzzy", vec!["#a".into(), "#b".into(), "#c".into()]);
        config.sasl = Some(SaslCredentials {
            user: "skuzzy".into(),
            password: "hunter2".into(),
        });
        config
    }

    fn sent(actions: &[Action]) -> Vec<&str> {
        actions
            .iter()
            .filter_map(|a| match a {
                Action::Send(line) | Action::SendSecret(line) => Some(line.as_str()),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn ping_is_answered_in_every_phase() {
        let mut machine = SessionMachine::new(sasl_config());
        machine.start();
        assert_eq!(machine.phase(), Phase::CapNegotiating);
        assert_eq!(
            feed(&mut machine, "PING :irc.example.net"),
            vec![Action::Send("PONG :irc.example.net".into())]
        );
        assert_eq!(machine.phase(), Phase::CapNegotiating);
    }

    #[test]
    fn start_twice_is_noop() {
        let mut machine = SessionMachine::new(sasl_config());
        assert_eq!(machine.start().len(), 1);
        assert!(machine.start().is_empty());
    }

    #[test]
    fn full_handshake_reaches_steady_state() {
        let mut machine = SessionMachine::new(sasl_config());
        assert_eq!(sent(&machine.start()), vec!["CAP REQ :sasl"]);

        assert_eq!(
            sent(&feed(&mut machine, ":srv CAP * ACK :sasl")),
            vec!["AUTHENTICATE PLAIN"]
        );
        assert_eq!(machine.phase(), Phase::Authenticating);

        let auth = feed(&mut machine, "AUTHENTICATE +");
        assert!(matches!(&auth[0], Action::SendSecret(l) if l.starts_with("AUTHENTICATE ")));

        let registration = feed(&mut machine, ":srv 903 skuzzy :SASL authentication successful");
        assert_eq!(
            sent(&registration),
            vec!["CAP END", "NICK skuzzy", "USER skuzzy 0 * :skuzzy"]
        );
        assert_eq!(machine.phase(), Phase::Registering);

        let joins = feed(&mut machine, ":skuzzy MODE skuzzy :+i");
        assert_eq!(sent(&joins), vec!["JOIN #a", "JOIN #b", "JOIN #c"]);
        assert_eq!(joins.last(), Some(&Action::Ready));
        assert_eq!(machine.phase(), Phase::SteadyState);

        // registration is single-shot
        assert!(feed(&mut machine, ":skuzzy MODE skuzzy :+w").is_empty());
    }

    #[test]
    fn sasl_failure_is_terminal() {
        let mut machine = SessionMachine::new(sasl_config());
        machine.start();
        feed(&mut machine, ":srv CAP * ACK :sasl");
        feed(&mut machine, "AUTHENTICATE +");
        let actions = feed(&mut machine, ":srv 904 skuzzy :SASL authentication failed");
        assert_eq!(
            actions,
            vec![Action::Terminate(TerminalReason::AuthRejected(904))]
        );
        assert!(machine.is_terminal());
        assert!(feed(&mut machine, "PING :x").is_empty());
    }

    #[test]
    fn two_silent_timeouts_terminate() {
        let mut machine = SessionMachine::new(SessionConfig::new("skuzzy", vec![]));
        machine.start();
        assert_eq!(
            machine.on_read_timeout(),
            vec![Action::Send("PING :skuzzy".into())]
        );
        assert_eq!(
            machine.on_read_timeout(),
            vec![Action::Terminate(TerminalReason::KeepaliveTimeout(2))]
        );
        assert!(machine.is_terminal());
    }

    #[test]
    fn activity_resets_ping_count() {
        let mut machine = SessionMachine::new(SessionConfig::new("skuzzy", vec![]));
        machine.start();
        machine.on_read_timeout();
        feed(&mut machine, ":srv PONG srv :skuzzy");
        assert_eq!(
            machine.on_read_timeout(),
            vec![Action::Send("PING :skuzzy".into())]
        );
        assert!(!machine.is_terminal());
    }

    #[test]
    fn welcome_without_mode_joins_on_timeout() {
        let mut machine = SessionMachine::new(SessionConfig::new("skuzzy", vec!["#a".into()]));
        machine.start();
        assert!(feed(&mut machine, ":srv 001 skuzzy :Welcome").is_empty());
        assert_eq!(machine.phase(), Phase::Registering);

        let actions = machine.on_read_timeout();
        assert_eq!(sent(&actions), vec!["JOIN #a"]);
        assert_eq!(actions.last(), Some(&Action::Ready));
        assert_eq!(machine.phase(), Phase::SteadyState);

        // Regular keep-alive afterwards.
        assert_eq!(
            machine.on_read_timeout(),
            vec![Action::Send("PING :skuzzy".into())]
        );
    }

    #[test]
    fn timeout_before_welcome_pings() {
        let mut machine = SessionMachine::new(SessionConfig::new("skuzzy", vec!["#a".into()]));
        machine.start();
        assert_eq!(
            machine.on_read_timeout(),
            vec![Action::Send("PING :skuzzy".into())]
        );
        assert_eq!(machine.phase(), Phase::Registering);
    }

    #[test]
    fn server_error_is_terminal() {
        let mut machine = SessionMachine::new(SessionConfig::new("skuzzy", vec![]));
        machine.start();
        let actions = feed(&mut machine, "ERROR :Closing Link");
        assert_eq!(
            actions,
            vec![Action::Terminate(TerminalReason::ServerError(
                "Closing Link".into()
            ))]
        );
    }
}
