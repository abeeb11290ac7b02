use std::sync::{Arc, Mutex};

use log::debug;

use super::fsm::{Conflict, Dir, State, StateMachine};
use super::{Econn, EconnConf, Inner, StateData};
use crate::error::{Error, Result};
use crate::handler::EconnHandler;
use crate::transport::EconnTransport;

/// Builder for [`Econn`] connections.
pub struct EconnBuilder {
    userid_self: String,
    clientid_self: String,
    conf: EconnConf,
    transp: Option<Arc<dyn EconnTransport>>,
    handler: Option<Arc<dyn EconnHandler>>,
}

impl EconnBuilder {
    /// Creates a builder for a connection owned by the given endpoint
    /// identity.
    pub fn new(userid_self: impl Into<String>, clientid_self: impl Into<String>) -> Self {
        Self {
            userid_self: userid_self.into(),
            clientid_self: clientid_self.into(),
            conf: EconnConf::default(),
            transp: None,
            handler: None,
        }
    }

    /// Overrides the timer configuration.
    pub fn with_conf(mut self, conf: EconnConf) -> Self {
        self.conf = conf;

        self
    }

    /// Sets the outbound signaling transport.
    pub fn with_transport(mut self, transp: impl EconnTransport) -> Self {
        self.transp = Some(Arc::new(transp));

        self
    }

    /// Sets the application callback handler.
    pub fn with_handler(mut self, handler: impl EconnHandler) -> Self {
        self.handler = Some(Arc::new(handler));

        self
    }

    /// Finalize the builder into an [`Econn`].
    ///
    /// Fails with [`Error::InvalidArg`] when either identifier is empty.
    pub fn build(self) -> Result<Econn> {
        if self.userid_self.is_empty() || self.clientid_self.is_empty() {
            return Err(Error::InvalidArg);
        }

        let sessid_local = crate::generate_sessid();

        debug!(
            "new connection [{}.{}], local session id '{}'",
            self.userid_self, self.clientid_self, sessid_local
        );

        Ok(Econn {
            inner: Arc::new(Inner {
                userid_self: self.userid_self,
                clientid_self: self.clientid_self,
                sessid_local,
                conf: self.conf,
                transp: self.transp,
                state: Mutex::new(StateData {
                    fsm: StateMachine::new(State::Idle),
                    dir: Dir::Unknown,
                    conflict: Conflict::None,
                    clientid_remote: String::new(),
                    sessid_remote: String::new(),
                    setup_err: None,
                    err: None,
                    tmr_local: None,
                    handler: self.handler,
                }),
            }),
        })
    }
}
