//! Per-phase handlers.

use super::{Action, Phase, SessionMachine, TerminalReason};
use crate::event::{InboundEvent, SaslOutcome};
use crate::names::next_collision_nick;
use crate::sasl::{chunk_payload, encode_plain};

impl SessionMachine {
    pub(super) fn on_cap(&mut self, event: &InboundEvent<'_>, actions: &mut Vec<Action>) {
        match event {
            InboundEvent::CapAck { caps } if caps.split_whitespace().any(|c| c == "sasl") => {
                self.phase = Phase::Authenticating;
                actions.push(Action::Send("AUTHENTICATE PLAIN".to_string()));
            }
            InboundEvent::CapNak { caps } => {
                self.terminate(actions, TerminalReason::CapRejected(caps.to_string()));
            }
            _ => {}
        }
    }

    pub(super) fn on_auth(&mut self, event: &InboundEvent<'_>, actions: &mut Vec<Action>) {
        match event {
            InboundEvent::AuthChallenge { data } if *data == "+" && !self.auth_sent => {
                let Some(creds) = self.config.sasl.as_ref() else {
                    return;
                };
                self.auth_sent = true;
                let payload = encode_plain(&creds.user, &creds.password);
                actions.extend(
                    chunk_payload(&payload)
                        .into_iter()
                        .map(|chunk| Action::SendSecret(format!("AUTHENTICATE {chunk}"))),
                );
            }
            InboundEvent::Sasl(SaslOutcome::Success) => self.register(actions),
            InboundEvent::Sasl(SaslOutcome::Failed(code)) => {
                self.terminate(actions, TerminalReason::AuthRejected(*code));
            }
            _ => {}
        }
    }

    pub(super) fn on_registration(&mut self, event: &InboundEvent<'_>, actions: &mut Vec<Action>) {
        match event {
            InboundEvent::NickInUse { .. } => {
                match next_collision_nick(&self.nick, self.config.max_nick_len) {
                    Some(next) => {
                        actions.push(Action::Send(format!("NICK {next}")));
                        self.nick = next;
                    }
                    None => {
                        let nick = self.nick.clone();
                        self.terminate(actions, TerminalReason::NickExhausted(nick));
                    }
                }
            }
            InboundEvent::Welcome => self.welcomed = true,
            InboundEvent::OwnMode => self.join(actions),
            _ => {}
        }
    }

    /// Send identity once. With SASL in play, capability negotiation is
    /// closed first.
    pub(super) fn register(&mut self, actions: &mut Vec<Action>) {
        self.phase = Phase::Registering;
        if self.registration_sent {
            return;
        }
        self.registration_sent = true;

        if self.config.sasl.is_some() {
            actions.push(Action::Send("CAP END".to_string()));
        }
        actions.push(Action::Send(format!("NICK {}", self.nick)));
        actions.push(Action::Send(format!(
            "USER {} 0 * :{}",
            self.config.username, self.config.realname
        )));
    }

    /// Registration confirmed: identify, join every channel in order, then
    /// settle into steady state.
    pub(super) fn join(&mut self, actions: &mut Vec<Action>) {
        self.phase = Phase::Joining;

        if let Some(password) = self.config.nickserv_password.as_deref() {
            actions.push(Action::SendSecret(format!(
                "PRIVMSG NickServ :IDENTIFY {} {password}",
                self.config.nickname
            )));
        }
        actions.extend(
            self.config
                .channels
                .iter()
                .map(|channel| Action::Send(format!("JOIN {channel}"))),
        );

        self.phase = Phase::SteadyState;
        actions.push(Action::Ready);
    }
}
