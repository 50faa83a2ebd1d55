/// Accepts packets one at a time and yields a reassembled unit once all
/// of its fragments have been consumed.
pub trait GenericFragmentComposer {
    type In;
    type Out;
    type Error;
    fn enqueue(&mut self, packet: Self::In) -> Result<Option<Self::Out>, Self::Error>;
}
