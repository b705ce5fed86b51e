use std::collections::{HashMap, HashSet};
use std::time::{Duration, Instant};
use base64::Engine;
use parking_lot::RwLock;
use crate::tprintln;

use super::principal::Principal;

pub type SessionToken = String;

#[derive(Debug, Clone)]
pub struct Session {
    pub session_id: String,
    pub token: SessionToken,
    pub principal: Principal,
    pub issued_at: Instant,
    pub expires_at: Instant,
}

fn gen_id() -> String {
    // 256-bit random token, base64url without padding
    let mut buf = [0u8; 32];
    let _ = getrandom::getrandom(&mut buf);
    base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(buf)
}

/// In-memory session table. All state is owned here and passed around
/// explicitly; validity is re-checked against the clock on every call.
pub struct SessionManager {
    ttl: Duration,
    sessions: RwLock<HashMap<String, Session>>,
    user_index: RwLock<HashMap<String, HashSet<String>>>,
    revoked: RwLock<HashSet<String>>,
}

impl Default for SessionManager {
    fn default() -> Self { Self::new(Duration::from_secs(7 * 24 * 3600)) }
}

impl SessionManager {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            sessions: RwLock::new(HashMap::new()),
            user_index: RwLock::new(HashMap::new()),
            revoked: RwLock::new(HashSet::new()),
        }
    }

    pub fn ttl(&self) -> Duration { self.ttl }

    pub fn issue(&self, principal: Principal) -> Session {
        let now = Instant::now();
        let sid = gen_id();
        let token = gen_id();
        let sess = Session {
            session_id: sid.clone(),
            token: token.clone(),
            principal: principal.clone(),
            issued_at: now,
            expires_at: now + self.ttl,
        };
        {
            let mut m = self.sessions.write();
            m.insert(token.clone(), sess.clone());
        }
        {
            let mut uidx = self.user_index.write();
            let set = uidx.entry(principal.member_id.clone()).or_insert_with(HashSet::new);
            set.insert(token);
        }
        tprintln!("session.issue member={} sid={} ttl_secs={}", principal.member_id, sid, self.ttl.as_secs());
        sess
    }

    pub fn validate(&self, token: &str) -> Option<Principal> {
        if self.revoked.read().contains(token) { return None; }
        let now = Instant::now();
        let mut drop_key: Option<String> = None;
        let out = {
            let map = self.sessions.read();
            if let Some(sess) = map.get(token) {
                if sess.expires_at > now {
                    Some(sess.principal.clone())
                } else {
                    drop_key = Some(token.to_string());
                    None
                }
            } else { None }
        };
        if let Some(k) = drop_key {
            self.sessions.write().remove(&k);
        }
        out
    }

    /// Rotate a valid session whose remaining lifetime has fallen under half
    /// the TTL. The old token is revoked; callers must hand the new token back
    /// to the client. Returns None when the session is missing, expired, or
    /// still fresh.
    pub fn refresh_if_stale(&self, token: &str) -> Option<Session> {
        let now = Instant::now();
        let principal = {
            let map = self.sessions.read();
            let sess = map.get(token)?;
            if sess.expires_at <= now { return None; }
            if sess.expires_at - now >= self.ttl / 2 { return None; }
            sess.principal.clone()
        };
        self.logout(token);
        Some(self.issue(principal))
    }

    pub fn logout(&self, token: &str) -> bool {
        let mut removed = false;
        if let Some(sess) = self.sessions.write().remove(token) {
            removed = true;
            let mid = sess.principal.member_id;
            let mut idx = self.user_index.write();
            if let Some(set) = idx.get_mut(&mid) { set.remove(token); }
            self.revoked.write().insert(token.to_string());
        }
        removed
    }

    pub fn revoke_user(&self, member_id: &str) -> usize {
        let mut count = 0usize;
        if let Some(tokens) = self.user_index.read().get(member_id).cloned() {
            let mut s = self.sessions.write();
            let mut r = self.revoked.write();
            for t in tokens.iter() {
                if s.remove(t).is_some() { count += 1; }
                r.insert(t.clone());
            }
        }
        tprintln!("session.revoke member={} count={}", member_id, count);
        count
    }
}
