//! The NMDC hub session state machine (§4.2.3): line-oriented
//! `$Command params|`, a nick-keyed roster, and the legacy lock-to-key
//! handshake, sharing the same [`HubState`] progression as the ADC session
//! even though none of the wire commands are shared.

use crate::config::HubConfig;
use crate::connect::{decide_connect, ConnectDecision, PeerConnectFacts};
use crate::effect::HubEffect;
use crate::error::ConnectError;
use crate::roster::NmdcRoster;
use crate::state::HubState;
use connmgr::token::{ConnType, TokenStore};
use core::clock::Clock;
use hooks::events::{ChatEvent, HookRegistry, IncomingChatMessageInput, ListenerRegistry, OutgoingPrivateMessageInput, SearchEvent, UserEvent};
use identity::{cid::synthetic_nmdc_cid, Identity, OnlineUser, User};
use protocol::nmdc::escape::{escape, unescape};
use protocol::nmdc::{command::build, Line};
use search::SearchQuery;
use std::collections::VecDeque;
use std::sync::Arc;

/// A live NMDC hub connection's protocol state, nick-keyed roster, and
/// pending outbound effects.
///
/// NMDC has no SID concept (§4.2.3): the roster is keyed by nick, and each
/// peer's [`identity::User`] is found (or created) under the synthetic CID
/// `identity::cid::synthetic_nmdc_cid` derives from `lowercase(nick) ||
/// lowercase(hub_url)`, so an NMDC peer shares the same process-wide user
/// map as an ADC one. The session is IPv4-only (§4.2.3).
pub struct NmdcHubSession<C: Clock> {
    config: HubConfig,
    state: HubState,
    roster: NmdcRoster,
    outbox: VecDeque<HubEffect>,
    hooks: Arc<HookRegistry>,
    listeners: Arc<ListenerRegistry>,
    tokens: Arc<TokenStore>,
    clock: Arc<C>,
    last_info_push_ms: u64,
    awaiting_my_info: bool,
}

impl<C: Clock> NmdcHubSession<C> {
    /// Builds a session that has not yet received the hub's `$Lock`.
    #[must_use]
    pub fn new(config: HubConfig, hooks: Arc<HookRegistry>, listeners: Arc<ListenerRegistry>, tokens: Arc<TokenStore>, clock: Arc<C>) -> Self {
        Self {
            config,
            state: HubState::Protocol,
            roster: NmdcRoster::new(),
            outbox: VecDeque::new(),
            hooks,
            listeners,
            tokens,
            clock,
            last_info_push_ms: 0,
            awaiting_my_info: false,
        }
    }

    /// The session's current state.
    #[must_use]
    pub const fn state(&self) -> HubState {
        self.state
    }

    /// The live roster.
    #[must_use]
    pub const fn roster(&self) -> &NmdcRoster {
        &self.roster
    }

    /// Drains every effect queued since the last call.
    pub fn take_outbox(&mut self) -> Vec<HubEffect> {
        self.outbox.drain(..).collect()
    }

    fn send(&mut self, line: String) {
        self.outbox.push_back(HubEffect::Send(line));
    }

    /// Begins the session: announces our nick and waits for the hub's
    /// `$Lock`.
    pub fn connect(&mut self) {
        self.send(build("MyNick", &[&self.config.nick]));
        self.state = HubState::Protocol;
    }

    /// Tears the session down from our side.
    pub fn disconnect(&mut self, graceful: bool) {
        if graceful && self.state.is_normal() {
            self.send(build("Quit", &[&self.config.nick]));
        }
        self.outbox.push_back(HubEffect::Disconnect);
        self.state = HubState::Disconnected;
    }

    /// Feeds one line read from the hub socket through the session.
    pub fn dispatch_line(&mut self, raw: &str) {
        let line = Line::parse(raw);
        match &line {
            Line::Command { keyword, params } => self.handle_command(keyword, params),
            Line::Chat(text) => self.handle_public_chat(text),
        }
    }

    fn handle_command(&mut self, keyword: &str, params: &str) {
        match keyword {
            "Lock" => self.handle_lock(params),
            "Hello" => self.handle_hello(params),
            "GetPass" => self.handle_get_pass(),
            "BadPass" => self.disconnect(false),
            "LogedIn" => {}
            "MyINFO" => self.handle_my_info(params),
            "Quit" => self.handle_quit(params),
            "To:" => self.handle_private_message(params),
            "ConnectToMe" => self.handle_connect_to_me(params),
            "RevConnectToMe" => self.handle_rev_connect_to_me(params),
            "ForceMove" => self.outbox.push_back(HubEffect::Redirect { target: params.to_string() }),
            _ => logging::debug_log(|flags| flags.nmdc == 1, || format!("unhandled hub command ${keyword}")),
        }
    }

    fn handle_lock(&mut self, params: &str) {
        let lock = params.split(' ').next().unwrap_or_default();
        let key = escape_key(&lock_to_key(lock.as_bytes()));
        self.send(build("Key", &[&key]));
        self.send(build("ValidateNick", &[&self.config.nick]));
        self.state = HubState::Identify;
    }

    fn handle_get_pass(&mut self) {
        let Some(password) = self.config.password.clone() else {
            self.disconnect(false);
            return;
        };
        self.send(build("MyPass", &[&password]));
        self.state = HubState::Verify;
    }

    fn handle_hello(&mut self, params: &str) {
        let nick = params.trim();
        if nick != self.config.nick {
            return;
        }
        self.state = HubState::Normal;
        self.send(build("Version", &["1,0091"]));
        self.awaiting_my_info = true;
        self.refresh_info(true);
        self.send(build("GetNickList", &[]));
    }

    fn handle_my_info(&mut self, params: &str) {
        // `$ALL <nick> <description>$ $<speed><flag>$<email>$<share>$`
        let Some(rest) = params.strip_prefix("$ALL ") else { return };
        let Some((nick, fields)) = rest.split_once(' ') else { return };
        let share_size = fields.rsplit('$').nth(1).and_then(|s| s.parse::<u64>().ok());

        if nick == self.config.nick {
            return;
        }

        let cid = synthetic_nmdc_cid(nick, &self.config.hub_url);
        if let Some(existing) = self.roster.get_mut(nick) {
            if let Some(size) = share_size {
                existing.identity_mut().set_field("SS", size.to_string());
            }
            self.listeners.user.emit(&UserEvent::Updated { cid: cid.to_base32() });
            return;
        }

        // NMDC has no SID concept; every roster entry shares the reserved
        // hub SID as a placeholder since the roster itself is nick-keyed.
        let mut identity = Identity::new(Arc::new(User::new(cid)), identity::HUB_SID);
        identity.set_field("NI", nick.to_string());
        if let Some(size) = share_size {
            identity.set_field("SS", size.to_string());
        }
        self.roster.insert(nick.to_string(), OnlineUser::new(identity, self.config.hub_url.clone()));
        self.listeners.user.emit(&UserEvent::Connected { cid: cid.to_base32() });
    }

    fn handle_quit(&mut self, params: &str) {
        let nick = params.trim();
        if nick == self.config.nick {
            self.outbox.push_back(HubEffect::Disconnect);
            self.state = HubState::Disconnected;
            return;
        }
        if let Some(user) = self.roster.remove(nick) {
            self.listeners.user.emit(&UserEvent::Disconnected { cid: user.identity().user().cid().to_base32() });
        }
    }

    fn handle_private_message(&mut self, params: &str) {
        // `<to_nick> From: <from_nick> $<text>`
        let Some((_, rest)) = params.split_once("From: ") else { return };
        let Some((from_nick, text)) = rest.split_once(" $") else { return };
        let text = unescape(text);
        let _ = self.hooks.incoming_chat_message.fire(&IncomingChatMessageInput {
            hub_url: self.config.hub_url.clone(),
            from_nick: from_nick.to_string(),
            text: text.clone(),
        });
        self.listeners.chat.emit(&ChatEvent { hub_url: self.config.hub_url.clone(), from_nick: from_nick.to_string(), text });
    }

    fn handle_public_chat(&mut self, text: &str) {
        let Some((from_nick, message)) = text.strip_prefix('<').and_then(|rest| rest.split_once("> ")) else { return };
        let message = unescape(message);
        let _ = self.hooks.incoming_chat_message.fire(&IncomingChatMessageInput {
            hub_url: self.config.hub_url.clone(),
            from_nick: from_nick.to_string(),
            text: message.clone(),
        });
        self.listeners.chat.emit(&ChatEvent { hub_url: self.config.hub_url.clone(), from_nick: from_nick.to_string(), text: message });
    }

    /// `$ConnectToMe <our_nick> <ip>:<port>`: the peer is offering a port
    /// for us to dial into directly. NMDC carries no correlation token on
    /// the wire, so the local token is synthesized from the peer address
    /// purely for `connmgr::TokenStore` bookkeeping.
    fn handle_connect_to_me(&mut self, params: &str) {
        let mut parts = params.split(' ');
        let Some(_our_nick) = parts.next() else { return };
        let Some(address) = parts.next() else { return };
        let Some((ip, port)) = address.split_once(':') else { return };
        let Ok(port) = port.parse::<u16>() else { return };
        let token = format!("nmdc:{ip}:{port}");
        self.tokens.expect(token.clone(), ConnType::Download);
        self.outbox.push_back(HubEffect::ConnectOut {
            peer_sid: identity::HUB_SID,
            protocol: format!("NMDC/{ip}"),
            port,
            token,
        });
    }

    /// `$RevConnectToMe <their_nick> <my_nick>`: the peer can't accept an
    /// inbound connection and is asking us to offer one instead.
    fn handle_rev_connect_to_me(&mut self, params: &str) {
        let Some((their_nick, _my_nick)) = params.split_once(' ') else { return };
        let token = format!("nmdc:{their_nick}:{}", self.config.my_port);
        self.tokens.expect(token, ConnType::Upload);
        self.send(build("ConnectToMe", &[their_nick, &format!("0.0.0.0:{}", self.config.my_port)]));
    }

    /// Sends a hub-wide chat message.
    pub fn hub_message(&mut self, text: &str) {
        if !self.state.is_normal() {
            return;
        }
        self.send(format!("<{}> {}|", self.config.nick, escape(text)));
    }

    /// Sends a private message to `to_nick`, subject to the
    /// `outgoing_private_message` hook.
    ///
    /// # Errors
    ///
    /// Returns the hook's [`hooks::Rejection`] if a subscriber vetoes it.
    pub fn private_message(&mut self, to_nick: &str, text: &str) -> Result<(), hooks::Rejection> {
        let cid = self.roster.get(to_nick).map_or_else(String::new, |user| user.identity().user().cid().to_base32());
        self.hooks.outgoing_private_message.fire(&OutgoingPrivateMessageInput { to_cid: cid, hub_url: self.config.hub_url.clone(), text: text.to_string() })?;
        self.send(format!("$To: {} From: {} ${}|", to_nick, self.config.nick, escape(text)));
        Ok(())
    }

    /// Issues a `$Search` for an already-allocated search `token`. NMDC has
    /// no correlation field on `$Search` itself, so matching a result back
    /// to `token` relies on the query text round-tripping unchanged, same
    /// as a real NMDC client.
    pub fn queue_search(&mut self, query: &SearchQuery, token: &str) {
        if !self.state.is_normal() {
            return;
        }
        let term = query.tth.clone().map_or_else(|| query.and_terms.join(" "), |tth| format!("TTH:{tth}"));
        self.send(format!("$Search Hub:{} F?T?0?9?{}|", self.config.nick, term));
        self.listeners.search.emit(&SearchEvent::Outgoing { hub_url: self.config.hub_url.clone(), token: token.to_string() });
    }

    /// Negotiates a C-C connect attempt toward `nick`, per §4.2.4: NMDC has
    /// no NAT-T, so a peer that can't accept a direct `$ConnectToMe`
    /// always falls back to `$RevConnectToMe` rather than traversal.
    ///
    /// # Errors
    ///
    /// Returns [`ConnectError`] if any precondition fails.
    pub fn connect_to_user(&mut self, nick: &str, facts: PeerConnectFacts) -> Result<(), ConnectError> {
        let token = self.tokens.create(ConnType::Download);
        let decision = decide_connect(self.state, &self.config, &facts, token.clone());
        let decision = decision.inspect_err(|_| self.tokens.remove(&token))?;
        match decision {
            ConnectDecision::Direct { .. } | ConnectDecision::NatTraversal { .. } => {
                self.send(build("ConnectToMe", &[nick, &format!("0.0.0.0:{}", self.config.my_port)]));
            }
            ConnectDecision::RequestReverse { .. } => {
                self.tokens.remove(&token);
                self.send(build("RevConnectToMe", &[&self.config.nick, nick]));
            }
        }
        Ok(())
    }

    /// Re-sends our own `$MyINFO` if the rate-limit interval has elapsed,
    /// or unconditionally when `force` is set.
    pub fn refresh_info(&mut self, force: bool) {
        if !self.state.is_normal() && !self.awaiting_my_info {
            return;
        }
        let now = self.clock.now_ms();
        if !force && now.saturating_sub(self.last_info_push_ms) < self.config.info_push_interval_ms {
            return;
        }
        self.awaiting_my_info = false;
        let info = format!("$ALL {} <DC V:0.1,M:A,H:1/0/0,S:{}>$ $100\u{1}$$${}$|", self.config.nick, self.config.slot_count, self.config.share_size);
        self.send(info);
        self.last_info_push_ms = now;
    }
}

impl<C: Clock> crate::session::HubSession for NmdcHubSession<C> {
    fn state(&self) -> HubState {
        self.state
    }

    fn hub_url(&self) -> &str {
        &self.config.hub_url
    }

    fn find_by_cid(&self, cid: identity::Cid) -> Option<&OnlineUser> {
        self.roster.find_by_cid(cid).map(|(_, user)| user)
    }

    fn find_by_sid(&self, _sid: identity::Sid) -> Option<&OnlineUser> {
        None
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

/// The classic NMDC lock-to-key transform: each key byte is the XOR of
/// adjacent lock bytes (with a fixed seed for the first byte), then every
/// byte's nibbles are swapped.
fn lock_to_key(lock: &[u8]) -> Vec<u8> {
    let len = lock.len();
    if len < 3 {
        return Vec::new();
    }
    let mut key = vec![0u8; len];
    key[0] = lock[0] ^ lock[len - 1] ^ lock[len - 2] ^ 5;
    for n in 1..len {
        key[n] = lock[n] ^ lock[n - 1];
    }
    for byte in &mut key {
        *byte = (*byte << 4) | (*byte >> 4);
    }
    key
}

/// Special key bytes (`0`, `5`, `36`, `96`, `124`, `126` - NUL, `$`-escape
/// collision bytes, and the wire delimiters `$`/`|`/`&`) can't appear raw
/// in a `|`-terminated line, so they're rendered as a fixed placeholder
/// sequence instead.
fn escape_key(key: &[u8]) -> String {
    let mut out = String::new();
    for &byte in key {
        match byte {
            0 | 5 | 36 | 96 | 124 | 126 => out.push_str(&format!("/%DCN{byte:03}%/")),
            _ => out.push(byte as char),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::clock::FakeClock;

    fn session() -> NmdcHubSession<FakeClock> {
        let config = HubConfig {
            hub_url: "dchub://hub.example:411".to_string(),
            nick: "me".to_string(),
            password: None,
            my_cid: identity::Cid::from_bytes(test_support::fake_192(9)),
            pid_base32: String::new(),
            features: vec![],
            share_size: 1024,
            slot_count: 3,
            my_port: 4000,
            tls_loaded: false,
            nat_t_supported: false,
            hub_hash_required: false,
            info_push_interval_ms: 60_000,
        };
        NmdcHubSession::new(config, Arc::new(HookRegistry::new()), Arc::new(ListenerRegistry::new()), Arc::new(TokenStore::new()), Arc::new(FakeClock::new()))
    }

    #[test]
    fn connect_sends_mynick() {
        let mut session = session();
        session.connect();
        let outbox = session.take_outbox();
        assert_eq!(outbox, vec![HubEffect::Send("$MyNick me|".to_string())]);
    }

    #[test]
    fn lock_then_hello_reaches_normal_and_pushes_myinfo() {
        let mut session = session();
        session.connect();
        session.take_outbox();
        session.dispatch_line("$Lock EXTENDEDPROTOCOL_ABCDEFGH Pk=dcengine");
        assert_eq!(session.state(), HubState::Identify);
        let outbox = session.take_outbox();
        assert!(matches!(&outbox[0], HubEffect::Send(line) if line.starts_with("$Key ")));
        assert_eq!(outbox[1], HubEffect::Send("$ValidateNick me|".to_string()));

        session.dispatch_line("$Hello me");
        assert_eq!(session.state(), HubState::Normal);
        let outbox = session.take_outbox();
        assert!(outbox.iter().any(|e| matches!(e, HubEffect::Send(line) if line.starts_with("$ALL me"))));
    }

    #[test]
    fn myinfo_from_another_nick_adds_a_roster_entry() {
        let mut session = session();
        session.dispatch_line("$MyINFO $ALL alice <DC V:0.1>$ $100\u{1}$$104857600$");
        assert_eq!(session.roster().len(), 1);
        assert!(session.roster().get("alice").is_some());
    }

    #[test]
    fn quit_removes_the_peer() {
        let mut session = session();
        session.dispatch_line("$MyINFO $ALL alice <DC V:0.1>$ $100\u{1}$$104857600$");
        session.dispatch_line("$Quit alice");
        assert!(session.roster().is_empty());
    }

    #[test]
    fn quit_for_our_own_nick_disconnects_us() {
        let mut session = session();
        session.dispatch_line("$Quit me");
        assert_eq!(session.state(), HubState::Disconnected);
    }

    #[test]
    fn rev_connect_to_me_replies_with_connect_to_me() {
        let mut session = session();
        session.dispatch_line("$RevConnectToMe alice me");
        let outbox = session.take_outbox();
        assert!(matches!(&outbox[0], HubEffect::Send(line) if line.starts_with("$ConnectToMe alice ")));
    }
}
