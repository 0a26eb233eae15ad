pub type Result<M> = std::result::Result<M, Error>;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("event stream ended before the tracker initialized")]
    EventStreamEnded,
    #[error("not enough in-range events before the seed for centered initialization")]
    NotEnoughEventsBeforeSeed,
}
