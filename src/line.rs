//! Bit-timing driver for the CEC line, plus the wire side of the
//! frame codec.
//!
//! One task owns the GPIO and multiplexes between receiving (edge
//! driven) and transmitting (timer driven). Everything here runs at
//! CEC v1.3a nominal timing: a 2.4 ms bit cell, '0' = 1.5 ms low /
//! 0.9 ms high, '1' = 0.6 ms low / 1.8 ms high, sample point 1.05 ms
//! after the falling edge, start bit 3.7 ms low + 0.8 ms high.
//!
//! ACK polarity: the addressed follower drives the ACK bit low. For
//! broadcast frames the meaning inverts and a low means rejection.

use core::sync::atomic::{AtomicU8, Ordering};

use defmt::{info, unwrap, warn};
use embassy_futures::join::join;
use embassy_futures::select::{select3, Either3};
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use embassy_sync::mutex::Mutex;
use embassy_sync::pubsub::{PubSubChannel, Subscriber, WaitResult};
use embassy_time::{with_timeout, Duration, Instant, Timer};
use heapless::{Deque, Vec};
use num_enum::IntoPrimitive;

use crate::frame::{CecFrame, FrameError, LogicalAddress, MAX_FRAME_LEN};

const DATA_BIT_NOMINAL_SAMPLE_TIME: Duration = Duration::from_micros(1050);
const DATA_ACK_ASSERTION_PERIOD: Duration = Duration::from_micros(1500);
const DATA_NOMINAL_PERIOD: Duration = Duration::from_micros(2400);

const BIT_ONE_LOW: Duration = Duration::from_micros(600);
const BIT_ONE_HIGH: Duration = Duration::from_micros(1800);
const BIT_ZERO_LOW: Duration = Duration::from_micros(1500);
const BIT_ZERO_HIGH: Duration = Duration::from_micros(900);

/// Release-to-sample-point gap on a '1' bit: 1.05 ms - 0.6 ms.
const POST_RELEASE_SAMPLE_DELAY: Duration = Duration::from_micros(450);
/// Sample point to end of cell: 2.4 ms - 1.05 ms.
const SAMPLE_TO_CELL_END: Duration = Duration::from_micros(1350);

const START_BIT_LOW: Duration = Duration::from_micros(3700);
const START_BIT_HIGH: Duration = Duration::from_micros(800);
const START_BIT_LOW_MIN: Duration = Duration::from_micros(3500);
const START_BIT_LOW_MAX: Duration = Duration::from_micros(3900);
const START_BIT_TOTAL_MIN: Duration = Duration::from_micros(4300);
const START_BIT_TOTAL_MAX: Duration = Duration::from_micros(4700);
const START_BIT_TIMEOUT: Duration = Duration::from_micros(5000);

/// No falling edge this long after a block means the frame ended.
const BLOCK_TIMEOUT: Duration = Duration::from_micros(2750);
/// Upper bound on one whole frame, 16 blocks plus the start bit.
const FRAME_TIMEOUT: Duration = Duration::from_millis(450);

/// The single open-drain CEC line. Implementations drive low, release
/// high, and expose edge waits backed by hardware edge interrupts.
#[allow(async_fn_in_trait)]
pub trait CecPin {
    fn set_low(&mut self);
    fn set_high(&mut self);
    fn is_low(&mut self) -> bool;
    fn is_high(&mut self) -> bool;
    async fn wait_for_falling_edge(&mut self);
    async fn wait_for_rising_edge(&mut self);
    async fn wait_for_high(&mut self);
}

/// Signal-free time before initiating, in nominal bit periods.
#[repr(u8)]
#[derive(IntoPrimitive, Clone, Copy, PartialEq, Eq)]
enum SignalFreeKind {
    /// First attempt by a new initiator.
    NewInitiator = 7,
    /// Retransmission after NACK, arbitration loss or a timing fault.
    Retransmit = 5,
    /// Next frame right after this node transmitted.
    SameInitiator = 3,
}

impl SignalFreeKind {
    fn required_free_duration(&self) -> Duration {
        u8::from(*self) as u32 * DATA_NOMINAL_PERIOD
    }
}

/// Logical address the receive path ACKs for. Unregistered (0x0f)
/// until the protocol task claims an address; it may change again
/// after a routing change.
static SELF_ADDR: AtomicU8 = AtomicU8::new(0x0f);

pub fn set_local_address(addr: LogicalAddress) {
    SELF_ADDR.store(addr.0, Ordering::Relaxed);
}

pub fn local_address() -> LogicalAddress {
    LogicalAddress(SELF_ADDR.load(Ordering::Relaxed))
}

#[derive(Debug, Clone, PartialEq, Eq, defmt::Format)]
pub enum CecRxError {
    /// Frame observed on the bus but not acknowledged by its
    /// destination.
    Nack(CecFrame),
    /// Bit-timing fault; the driver resynchronizes at the next start
    /// bit.
    Timing(&'static str),
    /// The byte sequence violates frame sanity limits.
    Invalid(FrameError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, defmt::Format)]
pub enum CecSendError {
    /// All attempts went unacknowledged.
    Nack,
    /// Another initiator held the line low where we sent '1'. The
    /// winner's header bits observed so far are carried along so the
    /// receive path can pick the frame up mid-byte.
    ArbitrationLost { bits: u8, next_bit: u8 },
    /// The attempt did not complete within the frame bound.
    Timeout,
}

static CEC_OUTGOING: Channel<CriticalSectionRawMutex, CecFrame, 1> = Channel::new();
static CEC_SEND_RESULT: Channel<CriticalSectionRawMutex, Result<(), CecSendError>, 1> =
    Channel::new();
static CEC_INCOMING: PubSubChannel<
    CriticalSectionRawMutex,
    Result<CecFrame, CecRxError>,
    4,
    5,
    1,
> = PubSubChannel::new();
static SEND_MUTEX: Mutex<CriticalSectionRawMutex, ()> = Mutex::new(());

/// Decode the blocks of one frame. The caller has consumed the start
/// bit; the line is at the first data bit's falling edge.
///
/// `resume` carries the state handed over by a transmission that lost
/// arbitration mid-header: the winner's bits accumulated so far and
/// the index of the next bit to sample.
async fn cec_decode<P: CecPin>(
    pin: &mut P,
    resume: Option<(u8, u8)>,
) -> Result<CecFrame, CecRxError> {
    let mut data = Vec::<u8, MAX_FRAME_LEN>::new();
    let mut have_nack_blocks = false;
    let mut eom_fused = false;
    let mut resume = resume;
    'block: loop {
        let (mut bits, first_bit) = match resume.take() {
            Some((bits, next_bit)) => {
                // We are inside the lost bit's cell, past its sample
                // point. Rejoin at the next cell boundary.
                pin.wait_for_falling_edge().await;
                (bits, next_bit)
            }
            None => (0, 0),
        };
        let mut eom = false;
        for bit in first_bit..=8 {
            Timer::after(DATA_BIT_NOMINAL_SAMPLE_TIME).await;
            match bit {
                0..=7 => {
                    if pin.is_high() {
                        bits |= 1 << (7 - bit);
                    }
                }
                _ => eom = pin.is_high(),
            }
            pin.wait_for_falling_edge().await;
        }

        let dest = LogicalAddress(if data.is_empty() {
            bits & 0x0f
        } else {
            data[0] & 0x0f
        });

        let ack_block = with_timeout(BLOCK_TIMEOUT, async {
            let own = local_address();
            let mut ack_low = false;
            if dest == own && !own.is_broadcast() {
                pin.set_low();
                Timer::after(DATA_ACK_ASSERTION_PERIOD).await;
                pin.set_high();
                ack_low = true;
            } else {
                Timer::after(DATA_BIT_NOMINAL_SAMPLE_TIME).await;
                if pin.is_low() {
                    ack_low = true;
                }
            }
            if !eom_fused && data.push(bits).is_err() {
                return Err(CecRxError::Invalid(FrameError::TooLong));
            }
            eom_fused = eom_fused || eom;
            if (!dest.is_broadcast() && ack_low) || (dest.is_broadcast() && !ack_low) {
                // Block acknowledged.
            } else {
                have_nack_blocks = true;
            }
            pin.wait_for_falling_edge().await;
            Ok(())
        })
        .await;

        match ack_block {
            Ok(Ok(())) => {}
            Ok(Err(err)) => return Err(err),
            // No further falling edge after EOM: frame complete.
            Err(_) => break 'block,
        }
    }

    if data.is_empty() {
        return Err(CecRxError::Timing("no blocks"));
    }
    let frame = CecFrame::from_bytes(&data).map_err(CecRxError::Invalid)?;
    if have_nack_blocks {
        Err(CecRxError::Nack(frame))
    } else {
        Ok(frame)
    }
}

/// Transmit one frame: start bit, then each block MSB first with EOM
/// and an ACK window. Arbitration is monitored on the header's '1'
/// bits; the sender samples where a competing '0' would still hold
/// the line low.
async fn cec_send<P: CecPin>(pin: &mut P, frame: &CecFrame) -> Result<(), CecSendError> {
    let mut have_nack_blocks = false;
    {
        // Start bit.
        pin.set_low();
        Timer::after(START_BIT_LOW).await;
        pin.set_high();
        Timer::after(START_BIT_HIGH).await;
    }
    let bytes = frame.to_bytes();
    let last = bytes.len() - 1;
    for (idx, payload) in bytes.iter().copied().enumerate() {
        let eom = idx == last;
        for bit_idx in 0..8u8 {
            let bit = ((payload >> (7 - bit_idx)) & 1) == 1;
            if bit && idx == 0 {
                pin.set_low();
                Timer::after(BIT_ONE_LOW).await;
                pin.set_high();
                Timer::after(POST_RELEASE_SAMPLE_DELAY).await;
                if pin.is_low() {
                    // The competing initiator's frame continues; hand
                    // the bits both of us sent over to the decoder.
                    // The losing bit itself decodes as '0'.
                    return Err(CecSendError::ArbitrationLost {
                        bits: payload & ((0xff00u16 >> bit_idx) as u8),
                        next_bit: bit_idx + 1,
                    });
                }
                Timer::after(SAMPLE_TO_CELL_END).await;
            } else {
                let (low, high) = if bit {
                    (BIT_ONE_LOW, BIT_ONE_HIGH)
                } else {
                    (BIT_ZERO_LOW, BIT_ZERO_HIGH)
                };
                pin.set_low();
                Timer::after(low).await;
                pin.set_high();
                Timer::after(high).await;
            }
        }
        {
            // EOM bit.
            let (low, high) = if eom {
                (BIT_ONE_LOW, BIT_ONE_HIGH)
            } else {
                (BIT_ZERO_LOW, BIT_ZERO_HIGH)
            };
            pin.set_low();
            Timer::after(low).await;
            pin.set_high();
            Timer::after(high).await;
        }
        {
            // ACK window: send '1', sample what the followers did.
            pin.set_low();
            Timer::after(BIT_ONE_LOW).await;
            pin.set_high();
            Timer::after(POST_RELEASE_SAMPLE_DELAY).await;
            let ack_low = pin.is_low();
            Timer::after(SAMPLE_TO_CELL_END).await;
            if (frame.dest.is_broadcast() && ack_low) || (!frame.dest.is_broadcast() && !ack_low) {
                have_nack_blocks = true;
            }
        }
    }
    if have_nack_blocks {
        Err(CecSendError::Nack)
    } else {
        Ok(())
    }
}

/// Owns the CEC GPIO: receives whatever appears on the bus and works
/// the outbound queue once the line has been free long enough.
pub async fn line_handler<P: CecPin>(mut pin: P) -> ! {
    let mut to_send = Deque::<CecFrame, 8>::new();
    let mut send_wait: Option<Duration> = None;
    let mut retry: Option<(CecFrame, usize)> = None;
    pin.wait_for_high().await;
    let mut free_since = Instant::now();
    let publisher = unwrap!(CEC_INCOMING.publisher());
    loop {
        if pin.is_low() {
            pin.wait_for_high().await;
            free_since = Instant::now();
        }
        let free_for = Instant::now() - free_since;
        let remaining_wait = send_wait.map_or(Duration::from_secs(3600), |send_wait| {
            send_wait
                .checked_sub(free_for)
                .unwrap_or(Duration::from_micros(0))
        });

        match select3(
            pin.wait_for_falling_edge(),
            CEC_OUTGOING.receive(),
            Timer::after(remaining_wait),
        )
        .await
        {
            Either3::First(_) => {
                // Validate the start bit before committing to decode.
                match with_timeout(START_BIT_TIMEOUT, async {
                    let frame_start = Instant::now();
                    pin.wait_for_rising_edge().await;
                    let low_duration = Instant::now() - frame_start;
                    pin.wait_for_falling_edge().await;
                    let total_duration = Instant::now() - frame_start;
                    low_duration >= START_BIT_LOW_MIN
                        && low_duration <= START_BIT_LOW_MAX
                        && total_duration >= START_BIT_TOTAL_MIN
                        && total_duration <= START_BIT_TOTAL_MAX
                })
                .await
                {
                    Ok(true) => {
                        match with_timeout(FRAME_TIMEOUT, cec_decode(&mut pin, None)).await {
                            Ok(result) => publisher.publish_immediate(result),
                            Err(_) => publisher.publish_immediate(Err(CecRxError::Timing(
                                "frame receive timed out",
                            ))),
                        }
                        // Well-defined level in case decode was
                        // cancelled while asserting ACK.
                        pin.set_high();
                    }
                    Ok(false) => {
                        publisher
                            .publish_immediate(Err(CecRxError::Timing("start bit out of range")));
                    }
                    Err(_) => {
                        publisher
                            .publish_immediate(Err(CecRxError::Timing("start bit never ended")));
                    }
                }

                pin.wait_for_high().await;
                free_since = Instant::now();
            }
            Either3::Second(frame) => {
                if to_send.push_back(frame).is_err() {
                    warn!("cec: outbound queue full, dropping frame");
                }
                if send_wait.is_none() {
                    send_wait = Some(
                        SignalFreeKind::NewInitiator
                            .required_free_duration()
                            .checked_sub(Instant::now() - free_since)
                            .unwrap_or(Duration::from_micros(0)),
                    );
                }
            }
            Either3::Third(_) => {
                send_wait = None;
                let (frame, attempts_left) = match retry.take() {
                    Some(pending) => pending,
                    None => match to_send.pop_front() {
                        Some(frame) => {
                            let attempts = frame.send_attempts();
                            (frame, attempts)
                        }
                        None => continue,
                    },
                };

                let result = match with_timeout(FRAME_TIMEOUT, cec_send(&mut pin, &frame)).await {
                    Ok(result) => result,
                    Err(_) => Err(CecSendError::Timeout),
                };

                if let Err(CecSendError::ArbitrationLost { bits, next_bit }) = result {
                    info!("cec: arbitration lost, receiving the winning frame");
                    match with_timeout(FRAME_TIMEOUT, cec_decode(&mut pin, Some((bits, next_bit))))
                        .await
                    {
                        Ok(rx) => publisher.publish_immediate(rx),
                        Err(_) => publisher
                            .publish_immediate(Err(CecRxError::Timing("frame receive timed out"))),
                    }
                    pin.set_high();
                }

                let attempts_left = attempts_left - 1;
                if result.is_err() && attempts_left > 0 {
                    retry = Some((frame, attempts_left));
                    send_wait = Some(SignalFreeKind::Retransmit.required_free_duration());
                } else {
                    CEC_SEND_RESULT.send(result).await;
                    if !to_send.is_empty() {
                        send_wait = Some(SignalFreeKind::SameInitiator.required_free_duration());
                    }
                }
                pin.wait_for_high().await;
                free_since = Instant::now();
            }
        }
    }
}

/// Queue a frame and wait for the line handler's verdict. Retries up
/// to the frame's attempt budget happen inside the handler.
pub async fn send_with_result(frame: CecFrame) -> Result<(), CecSendError> {
    let _guard = SEND_MUTEX.lock().await;
    join(CEC_OUTGOING.send(frame), CEC_SEND_RESULT.receive())
        .await
        .1
}

/// Probe a logical address with a polling frame. `true` means some
/// device acknowledged it, i.e. the address is taken.
pub async fn ping(addr: LogicalAddress) -> bool {
    send_with_result(CecFrame::polling(addr)).await.is_ok()
}

pub type IncomingSubscriber =
    Subscriber<'static, CriticalSectionRawMutex, Result<CecFrame, CecRxError>, 4, 5, 1>;

pub fn subscribe_incoming() -> Result<IncomingSubscriber, embassy_sync::pubsub::Error> {
    CEC_INCOMING.subscriber()
}

/// Next well-formed frame addressed to this node or to everyone.
pub async fn recv_frame(sub: &mut IncomingSubscriber) -> CecFrame {
    loop {
        match sub.next_message().await {
            WaitResult::Lagged(lost) => {
                warn!("cec: receiver lagged, {} frames lost", lost);
            }
            WaitResult::Message(Ok(frame)) => {
                let own = local_address();
                if frame.dest.is_broadcast() || (frame.dest == own && !own.is_broadcast()) {
                    return frame;
                }
            }
            WaitResult::Message(Err(CecRxError::Nack(_))) => {
                // Somebody else's unacknowledged traffic, e.g. polls.
            }
            WaitResult::Message(Err(fault)) => {
                info!("cec: rx fault: {}", fault);
            }
        }
    }
}
