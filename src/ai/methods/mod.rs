pub mod chat_session;
