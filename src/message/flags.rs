use bitflags::bitflags;

bitflags! {
  /// Flags carried by a single `Msg` frame.
  #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
  pub struct MsgFlags: u8 {
    /// More frames of the same message follow this one.
    const MORE = 0b01;
  }
}
