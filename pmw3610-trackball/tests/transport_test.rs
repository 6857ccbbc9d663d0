pub mod common;

use embedded_hal_mock::eh1::digital::{Mock as PinMock, State as PinState, Transaction as PinTransaction};
use embedded_hal_mock::eh1::spi::{Mock as SpiMock, Transaction as SpiTransaction};
use pmw3610_trackball::Pmw3610Error;
use pmw3610_trackball::transport::RegisterTransport;
use rusty_fork::rusty_fork_test;

use crate::common::{FakeCs, FakeSpi, test_block_on};

fn selects(n: usize) -> Vec<PinTransaction> {
    (0..n)
        .flat_map(|_| [PinTransaction::set(PinState::Low), PinTransaction::set(PinState::High)])
        .collect()
}

rusty_fork_test! {
    #[test]
    fn test_read_register() {
        let spi = SpiMock::<u8>::new(&[SpiTransaction::write(0x2d), SpiTransaction::read(0x0f)]);
        let cs = PinMock::new(&selects(1));
        let mut transport = RegisterTransport::new(spi, cs);

        assert_eq!(test_block_on(transport.read(0x2d)), Ok(0x0f));

        let (mut spi, mut cs) = transport.release();
        spi.done();
        cs.done();
    }

    #[test]
    fn test_write_register() {
        let spi = SpiMock::<u8>::new(&[
            // SPI clock on
            SpiTransaction::write_vec(vec![0xc1, 0xba]),
            SpiTransaction::write_vec(vec![0xba, 0x5a]),
            // SPI clock off
            SpiTransaction::write_vec(vec![0xc1, 0xb5]),
        ]);
        let cs = PinMock::new(&selects(3));
        let mut transport = RegisterTransport::new(spi, cs);

        assert_eq!(test_block_on(transport.write(0x3a, 0x5a)), Ok(()));

        let (mut spi, mut cs) = transport.release();
        spi.done();
        cs.done();
    }

    #[test]
    fn test_burst_write() {
        let spi = SpiMock::<u8>::new(&[
            SpiTransaction::write_vec(vec![0xc1, 0xba]),
            SpiTransaction::write_vec(vec![0xff, 0xff]),
            SpiTransaction::write_vec(vec![0x85, 0x03]),
            SpiTransaction::write_vec(vec![0xff, 0x00]),
            SpiTransaction::write_vec(vec![0xc1, 0xb5]),
        ]);
        let cs = PinMock::new(&selects(5));
        let mut transport = RegisterTransport::new(spi, cs);

        assert_eq!(
            test_block_on(transport.burst_write(&[0x7f, 0x05, 0x7f], &[0xff, 0x03, 0x00])),
            Ok(())
        );

        let (mut spi, mut cs) = transport.release();
        spi.done();
        cs.done();
    }

    #[test]
    fn test_burst_read() {
        let frame = vec![0x80, 0x05, 0xfb, 0x0f, 0x40, 0x00, 0x20];
        let spi = SpiMock::<u8>::new(&[SpiTransaction::write(0x12), SpiTransaction::read_vec(frame.clone())]);
        let cs = PinMock::new(&selects(1));
        let mut transport = RegisterTransport::new(spi, cs);

        let mut buf = [0u8; 7];
        assert_eq!(test_block_on(transport.burst_read(&mut buf)), Ok(()));
        assert_eq!(buf.to_vec(), frame);

        let (mut spi, mut cs) = transport.release();
        spi.done();
        cs.done();
    }

    #[test]
    fn test_pulse_chip_select() {
        let spi = SpiMock::<u8>::new(&[]);
        let cs = PinMock::new(&[PinTransaction::set(PinState::High), PinTransaction::set(PinState::Low)]);
        let mut transport = RegisterTransport::new(spi, cs);

        assert_eq!(test_block_on(transport.pulse_chip_select()), Ok(()));

        let (mut spi, mut cs) = transport.release();
        spi.done();
        cs.done();
    }

    #[test]
    fn test_chip_select_released_after_bus_failure() {
        let spi = FakeSpi::default();
        let cs = FakeCs::default();
        spi.state.borrow_mut().fail = true;
        let mut transport = RegisterTransport::new(spi.clone(), cs.clone());

        assert_eq!(test_block_on(transport.read(0x2d)), Err(Pmw3610Error::Io));
        assert!(!cs.low.get());

        assert_eq!(test_block_on(transport.write(0x3a, 0x5a)), Err(Pmw3610Error::Io));
        assert!(!cs.low.get());

        let mut frame = [0u8; 7];
        assert_eq!(test_block_on(transport.burst_read(&mut frame)), Err(Pmw3610Error::Io));
        assert!(!cs.low.get());

        // The bus recovers on the next transaction
        spi.state.borrow_mut().fail = false;
        assert_eq!(test_block_on(transport.read(0x2d)), Ok(0x0f));
        assert!(!cs.low.get());
    }
}
