//! The ADC hub session state machine (§4.2): `PROTOCOL` → `IDENTIFY` →
//! `VERIFY` → `NORMAL`, roster maintenance from `BINF`/`IQUI`, and the
//! chat/search/connect operations built on top of it.

use crate::config::HubConfig;
use crate::connect::{decide_connect, ConnectDecision, PeerConnectFacts};
use crate::effect::HubEffect;
use crate::error::ConnectError;
use crate::roster::AdcRoster;
use crate::state::HubState;
use checksums::tth::{hash_leaf, Tiger192};
use connmgr::token::{ConnType, TokenStore};
use core::clock::Clock;
use hooks::events::{
    ChatEvent, HookRegistry, IncomingChatMessageInput, ListenerRegistry, OutgoingPrivateMessageInput, SearchEvent, UserEvent,
};
use identity::{Identity, OnlineUser, Sid, User};
use protocol::adc::command::CommandHandler;
use protocol::adc::escape::unescape;
use protocol::adc::{Command, CommandType, FourCc};
use search::SearchQuery;
use std::collections::VecDeque;
use std::sync::Arc;

/// A live ADC hub connection's protocol state, roster, and pending
/// outbound effects.
pub struct AdcHubSession<C: Clock> {
    config: HubConfig,
    state: HubState,
    roster: AdcRoster,
    my_sid: Option<Sid>,
    sent_pid: bool,
    outbox: VecDeque<HubEffect>,
    hooks: Arc<HookRegistry>,
    listeners: Arc<ListenerRegistry>,
    tokens: Arc<TokenStore>,
    clock: Arc<C>,
    last_info_push_ms: u64,
}

impl<C: Clock> AdcHubSession<C> {
    /// Builds a session that has not yet sent `HSUP`.
    #[must_use]
    pub fn new(config: HubConfig, hooks: Arc<HookRegistry>, listeners: Arc<ListenerRegistry>, tokens: Arc<TokenStore>, clock: Arc<C>) -> Self {
        Self {
            config,
            state: HubState::Protocol,
            roster: AdcRoster::new(),
            my_sid: None,
            sent_pid: false,
            outbox: VecDeque::new(),
            hooks,
            listeners,
            tokens,
            clock,
            last_info_push_ms: 0,
        }
    }

    /// The session's current state.
    #[must_use]
    pub const fn state(&self) -> HubState {
        self.state
    }

    /// Our assigned SID, once past `IDENTIFY`.
    #[must_use]
    pub const fn my_sid(&self) -> Option<Sid> {
        self.my_sid
    }

    /// The live roster.
    #[must_use]
    pub const fn roster(&self) -> &AdcRoster {
        &self.roster
    }

    /// Drains every effect queued since the last call.
    pub fn take_outbox(&mut self) -> Vec<HubEffect> {
        self.outbox.drain(..).collect()
    }

    fn send(&mut self, command: Command) {
        self.outbox.push_back(HubEffect::Send(command.to_wire_string()));
    }

    /// Begins the session: sends `HSUP` and moves to `PROTOCOL`.
    pub fn connect(&mut self) {
        let mut sup = Command::new(CommandType::Hub, FourCc::SUP);
        for feature in &self.config.features {
            sup = sup.with_param(format!("AD{feature}"));
        }
        self.send(sup);
        self.state = HubState::Protocol;
    }

    /// Tears the session down from our side.
    pub fn disconnect(&mut self, graceful: bool) {
        if graceful && self.state.is_normal() {
            self.send(Command::new(CommandType::Hub, FourCc::QUI));
        }
        self.outbox.push_back(HubEffect::Disconnect);
        self.state = HubState::Disconnected;
    }

    /// Feeds one line read from the hub socket through the ADC dispatcher.
    pub fn dispatch_line(&mut self, line: &str) {
        self.dispatch(line);
    }

    fn build_binf(&mut self) -> Command {
        let share_size = self.config.share_size.to_string();
        let slot_count = self.config.slot_count.to_string();
        let supports = self.config.supports_field();
        let mut binf = Command::new(CommandType::Broadcast, FourCc::INF)
            .with_from(self.my_sid.expect("BINF only built after ISID").as_str())
            .with_named_param("ID", &self.config.my_cid.to_base32())
            .with_named_param("NI", &self.config.nick)
            .with_named_param("SS", &share_size)
            .with_named_param("SL", &slot_count)
            .with_named_param("SU", &supports);
        if !self.sent_pid {
            binf = binf.with_named_param("PD", &self.config.pid_base32);
            self.sent_pid = true;
        }
        binf
    }

    fn own_identity(&self) -> Identity {
        let sid = self.my_sid.expect("own_identity only built after ISID");
        let mut identity = Identity::new(Arc::new(User::new(self.config.my_cid)), sid);
        identity.set_field("NI", self.config.nick.clone());
        identity.set_field("SS", self.config.share_size.to_string());
        identity.set_field("SL", self.config.slot_count.to_string());
        identity
    }

    fn apply_fields(identity: &mut Identity, command: &Command) {
        for raw in command.raw_params() {
            if raw.len() < 2 {
                continue;
            }
            let (code, value) = raw.split_at(2);
            identity.set_field(code, unescape(value));
        }
    }

    fn handle_isup(&mut self) {
        if self.state == HubState::Protocol {
            self.state = HubState::Identify;
        }
    }

    fn handle_isid(&mut self, command: &Command) {
        let Some(sid_str) = command.param(0) else { return };
        let Ok(sid) = Sid::parse(&sid_str) else { return };
        self.my_sid = Some(sid);
        let identity = self.own_identity();
        self.roster.insert(sid, OnlineUser::new(identity, self.config.hub_url.clone()));
        let binf = self.build_binf();
        self.send(binf);
        self.last_info_push_ms = self.clock.now_ms();
    }

    fn handle_igpa(&mut self, command: &Command) {
        let Some(salt_b32) = command.param(0) else { return };
        let Some(password) = self.config.password.clone() else { return };
        let salt = data_encoding::BASE32.decode(pad_base32(&salt_b32).as_bytes()).unwrap_or_default();
        let mut input = password.into_bytes();
        input.extend(salt);
        let digest: Tiger192 = hash_leaf(&input);
        let pas = Command::new(CommandType::Hub, FourCc::PAS).with_param(digest.to_base32());
        self.send(pas);
        self.state = HubState::Verify;
    }

    fn handle_binf(&mut self, command: &Command) {
        let Some(from) = command.from() else { return };
        let Ok(sid) = Sid::parse(from) else { return };

        if Some(sid) == self.my_sid && matches!(self.state, HubState::Identify | HubState::Verify) {
            self.state = HubState::Normal;
        }

        if let Some(existing) = self.roster.get_mut(sid) {
            Self::apply_fields(existing.identity_mut(), command);
            self.listeners.user.emit(&UserEvent::Updated { cid: existing.identity().user().cid().to_base32() });
            return;
        }

        let id_param = command.named_param("ID").and_then(|value| Tiger192::from_base32(&value).ok());
        let Some(cid) = id_param else { return };
        let mut identity = Identity::new(Arc::new(User::new(cid)), sid);
        Self::apply_fields(&mut identity, command);
        let cid_str = cid.to_base32();
        self.roster.insert(sid, OnlineUser::new(identity, self.config.hub_url.clone()));
        self.listeners.user.emit(&UserEvent::Connected { cid: cid_str });
    }

    fn handle_iqui(&mut self, command: &Command) {
        let Some(sid_str) = command.param(0) else { return };
        let Ok(sid) = Sid::parse(&sid_str) else { return };
        let redirect = command.named_param("RD");

        if Some(sid) == self.my_sid {
            if let Some(target) = redirect {
                self.outbox.push_back(HubEffect::Redirect { target });
            }
            self.outbox.push_back(HubEffect::Disconnect);
            self.state = HubState::Disconnected;
            return;
        }

        if let Some(user) = self.roster.remove(sid) {
            self.listeners.user.emit(&UserEvent::Disconnected { cid: user.identity().user().cid().to_base32() });
        }
    }

    fn handle_direct_msg(&mut self, command: &Command) {
        let Some(from_sid_str) = command.from() else { return };
        let Ok(from_sid) = Sid::parse(from_sid_str) else { return };
        let Some(text) = command.param(0) else { return };
        let from_nick = self.roster.get(from_sid).map_or_else(|| from_sid_str.to_string(), |user| user.identity().nick().to_string());

        let _ = self.hooks.incoming_chat_message.fire(&IncomingChatMessageInput {
            hub_url: self.config.hub_url.clone(),
            from_nick: from_nick.clone(),
            text: text.clone(),
        });
        self.listeners.chat.emit(&ChatEvent { hub_url: self.config.hub_url.clone(), from_nick, text });
    }

    /// `DCTM`: the peer is offering a port for us to dial into.
    fn handle_ctm(&mut self, command: &Command) {
        let Some(from_sid_str) = command.from() else { return };
        let Ok(peer_sid) = Sid::parse(from_sid_str) else { return };
        let Some(protocol) = command.param(0) else { return };
        let Some(port) = command.param(1).and_then(|p| p.parse().ok()) else { return };
        let Some(token) = command.param(2) else { return };
        self.tokens.expect(token.clone(), ConnType::Download);
        self.outbox.push_back(HubEffect::ConnectOut { peer_sid, protocol, port, token });
    }

    /// `DRCM`: the peer can't accept an inbound connection and is asking
    /// us to offer one instead, so we answer with our own `DCTM` carrying
    /// their token back.
    fn handle_rcm(&mut self, command: &Command) {
        let Some(from_sid_str) = command.from() else { return };
        let Ok(peer_sid) = Sid::parse(from_sid_str) else { return };
        let Some(my_sid) = self.my_sid else { return };
        let Some(protocol) = command.param(0) else { return };
        let Some(token) = command.param(1) else { return };
        self.tokens.expect(token.clone(), ConnType::Upload);
        let ctm = Command::new(CommandType::Direct, FourCc::CTM)
            .with_from(my_sid.as_str())
            .with_to(peer_sid.as_str())
            .with_param(protocol)
            .with_param(self.config.my_port.to_string())
            .with_param(token);
        self.send(ctm);
    }

    fn handle_direct_nat(&mut self, command: &Command) {
        let Some(from_sid_str) = command.from() else { return };
        let Ok(peer_sid) = Sid::parse(from_sid_str) else { return };
        let Some(protocol) = command.param(0) else { return };
        let port: u16 = command.param(1).and_then(|p| p.parse().ok()).unwrap_or(0);
        let Some(token) = command.param(2) else { return };
        self.tokens.expect(token.clone(), ConnType::Download);
        self.outbox.push_back(HubEffect::NatTraversal { peer_sid, protocol, port, token });
    }

    fn handle_sta(&mut self, command: &Command) {
        let Some(code_str) = command.param(0) else { return };
        let Some(severity_digit) = code_str.chars().next().and_then(|c| c.to_digit(10)) else { return };
        let Ok(severity_digit) = u8::try_from(severity_digit) else { return };
        if protocol::adc::Severity::from_digit(severity_digit) == Some(protocol::adc::Severity::Fatal) {
            self.outbox.push_back(HubEffect::Disconnect);
            self.state = HubState::Disconnected;
        }
    }

    /// Sends a hub-wide chat message.
    pub fn hub_message(&mut self, text: &str) {
        if !self.state.is_normal() {
            return;
        }
        let Some(sid) = self.my_sid else { return };
        let command = Command::new(CommandType::Broadcast, FourCc::MSG).with_from(sid.as_str()).with_param(text);
        self.send(command);
    }

    /// Sends a private message to `to`, subject to the
    /// `outgoing_private_message` hook.
    ///
    /// # Errors
    ///
    /// Returns the hook's [`hooks::Rejection`] if a subscriber vetoes it.
    pub fn private_message(&mut self, to: Sid, text: &str) -> Result<(), hooks::Rejection> {
        self.hooks.outgoing_private_message.fire(&OutgoingPrivateMessageInput {
            to_cid: self.roster.get(to).map_or_else(String::new, |user| user.identity().user().cid().to_base32()),
            hub_url: self.config.hub_url.clone(),
            text: text.to_string(),
        })?;
        let Some(sid) = self.my_sid else { return Ok(()) };
        let command = Command::new(CommandType::Echo, FourCc::MSG).with_from(sid.as_str()).with_to(to.as_str()).with_param(text);
        self.send(command);
        Ok(())
    }

    /// Issues the wire `BSCH` for an already-allocated search `token`.
    pub fn queue_search(&mut self, query: &SearchQuery, token: &str) {
        if !self.state.is_normal() {
            return;
        }
        let mut command = Command::new(CommandType::Broadcast, FourCc::SCH).with_from(self.my_sid.map_or_else(String::new, |s| s.as_str().to_string()));
        if let Some(tth) = &query.tth {
            command = command.with_named_param("TR", tth);
        } else {
            for term in &query.and_terms {
                command = command.with_named_param("AN", term);
            }
            for term in &query.exclude_terms {
                command = command.with_named_param("NO", term);
            }
        }
        command = command.with_named_param("TO", token);
        self.send(command);
        self.listeners.search.emit(&SearchEvent::Outgoing { hub_url: self.config.hub_url.clone(), token: token.to_string() });
    }

    /// Negotiates a C-C connect attempt toward `peer`, per §4.2.4.
    ///
    /// # Errors
    ///
    /// Returns [`ConnectError`] if any precondition fails.
    pub fn connect_to_user(&mut self, peer: Sid, facts: PeerConnectFacts) -> Result<(), ConnectError> {
        let token = self.tokens.create(ConnType::Download);
        let decision = decide_connect(self.state, &self.config, &facts, token.clone());
        let decision = decision.inspect_err(|_| self.tokens.remove(&token))?;
        let Some(my_sid) = self.my_sid else { return Err(ConnectError::BadState) };
        match decision {
            ConnectDecision::Direct { protocol, port, token } => {
                let command = Command::new(CommandType::Direct, FourCc::CTM)
                    .with_from(my_sid.as_str())
                    .with_to(peer.as_str())
                    .with_param(protocol)
                    .with_param(port.to_string())
                    .with_param(token);
                self.send(command);
            }
            ConnectDecision::NatTraversal { protocol, port, token } => {
                let command = Command::new(CommandType::Direct, FourCc::NAT)
                    .with_from(my_sid.as_str())
                    .with_to(peer.as_str())
                    .with_param(protocol)
                    .with_param(port.to_string())
                    .with_param(token);
                self.send(command);
            }
            ConnectDecision::RequestReverse { protocol, token } => {
                let command = Command::new(CommandType::Direct, FourCc::RCM)
                    .with_from(my_sid.as_str())
                    .with_to(peer.as_str())
                    .with_param(protocol)
                    .with_param(token);
                self.send(command);
            }
        }
        Ok(())
    }

    /// Re-pushes our own `BINF` if the rate-limit interval has elapsed,
    /// or unconditionally when `force` is set (e.g. share size changed).
    pub fn refresh_info(&mut self, force: bool) {
        if !self.state.is_normal() {
            return;
        }
        let now = self.clock.now_ms();
        if !force && now.saturating_sub(self.last_info_push_ms) < self.config.info_push_interval_ms {
            return;
        }
        let binf = self.build_binf();
        self.send(binf);
        self.last_info_push_ms = now;
    }
}

impl<C: Clock> crate::session::HubSession for AdcHubSession<C> {
    fn state(&self) -> HubState {
        self.state
    }

    fn hub_url(&self) -> &str {
        &self.config.hub_url
    }

    fn find_by_cid(&self, cid: identity::Cid) -> Option<&OnlineUser> {
        self.roster.find_by_cid(cid).map(|(_, user)| user)
    }

    fn find_by_sid(&self, sid: identity::Sid) -> Option<&OnlineUser> {
        self.roster.get(sid)
    }

    fn queue_search(&mut self, query: &search::SearchQuery, token: &str) {
        Self::queue_search(self, query, token);
    }

    fn connect(&mut self) {
        Self::connect(self);
    }

    fn disconnect(&mut self, graceful: bool) {
        Self::disconnect(self, graceful);
    }

    fn dispatch_line(&mut self, line: &str) {
        Self::dispatch_line(self, line);
    }

    fn hub_message(&mut self, text: &str) {
        Self::hub_message(self, text);
    }

    fn refresh_info(&mut self, force: bool) {
        Self::refresh_info(self, force);
    }

    fn take_outbox(&mut self) -> Vec<HubEffect> {
        Self::take_outbox(self)
    }
}

impl<C: Clock> CommandHandler for AdcHubSession<C> {
    fn handle(&mut self, command: Command) {
        if command.kind() == CommandType::Info && command.code() == FourCc::SUP {
            self.handle_isup();
        } else if command.kind() == CommandType::Info && command.code() == FourCc::SID {
            self.handle_isid(&command);
        } else if command.kind() == CommandType::Info && command.code() == FourCc::GPA {
            self.handle_igpa(&command);
        } else if command.kind() == CommandType::Info && command.code() == FourCc::QUI {
            self.handle_iqui(&command);
        } else if command.code() == FourCc::STA {
            self.handle_sta(&command);
        } else if command.kind() == CommandType::Broadcast && command.code() == FourCc::INF {
            self.handle_binf(&command);
        } else if command.kind() == CommandType::Broadcast && command.code() == FourCc::MSG {
            self.handle_direct_msg(&command);
        } else if command.kind() == CommandType::Echo && command.code() == FourCc::MSG {
            self.handle_direct_msg(&command);
        } else if command.kind() == CommandType::Direct && command.code() == FourCc::CTM {
            self.handle_ctm(&command);
        } else if command.kind() == CommandType::Direct && command.code() == FourCc::RCM {
            self.handle_rcm(&command);
        } else if command.kind() == CommandType::Direct && command.code() == FourCc::NAT {
            self.handle_direct_nat(&command);
        } else {
            logging::debug_log(|flags| flags.adc == 1, || format!("unhandled hub command {}{}", command.kind().as_char(), command.code()));
        }
    }
}

fn pad_base32(input: &str) -> String {
    let remainder = input.len() % 8;
    if remainder == 0 {
        return input.to_string();
    }
    let mut padded = input.to_string();
    padded.extend(std::iter::repeat('=').take(8 - remainder));
    padded
}
