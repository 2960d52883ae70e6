/*
Copyright 2025 Connor Nolan

Licensed under the Apache License, Version 2.0 (the "License");
you may not use this file except in compliance with the License.
You may obtain a copy of the License at

    http://www.apache.org/licenses/LICENSE-2.0

Unless required by applicable law or agreed to in writing, software
distributed under the License is distributed on an "AS IS" BASIS,
WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
See the License for the specific language governing permissions and
limitations under the License.
*/

//! ATmega328P special function register aliases and bit-position names.
//! Registers in the low I/O space carry their I/O addresses (usable with
//! IN/OUT/SBI/CBI); the extended registers carry data-space addresses for
//! LDS/STS.

use crate::assembler::symbol_env::SymbolEnv;

// Low I/O space, addresses 0x00-0x3F.
const IO_REGISTERS: &[(&str, i64)] = &[
    ("PINB", 0x03),
    ("DDRB", 0x04),
    ("PORTB", 0x05),
    ("PINC", 0x06),
    ("DDRC", 0x07),
    ("PORTC", 0x08),
    ("PIND", 0x09),
    ("DDRD", 0x0A),
    ("PORTD", 0x0B),
    ("TIFR0", 0x15),
    ("TIFR1", 0x16),
    ("TIFR2", 0x17),
    ("PCIFR", 0x1B),
    ("EIFR", 0x1C),
    ("EIMSK", 0x1D),
    ("GPIOR0", 0x1E),
    ("EECR", 0x1F),
    ("EEDR", 0x20),
    ("EEARL", 0x21),
    ("EEARH", 0x22),
    ("GTCCR", 0x23),
    ("TCCR0A", 0x24),
    ("TCCR0B", 0x25),
    ("TCNT0", 0x26),
    ("OCR0A", 0x27),
    ("OCR0B", 0x28),
    ("GPIOR1", 0x2A),
    ("GPIOR2", 0x2B),
    ("SPCR", 0x2C),
    ("SPSR", 0x2D),
    ("SPDR", 0x2E),
    ("ACSR", 0x30),
    ("SMCR", 0x33),
    ("MCUSR", 0x34),
    ("MCUCR", 0x35),
    ("SPMCSR", 0x37),
    ("SPL", 0x3D),
    ("SPH", 0x3E),
    ("SREG", 0x3F),
];

// Extended register file, data-space addresses.
const MEM_REGISTERS: &[(&str, i64)] = &[
    ("WDTCSR", 0x60),
    ("CLKPR", 0x61),
    ("PRR", 0x64),
    ("OSCCAL", 0x66),
    ("PCICR", 0x68),
    ("EICRA", 0x69),
    ("PCMSK0", 0x6B),
    ("PCMSK1", 0x6C),
    ("PCMSK2", 0x6D),
    ("TIMSK0", 0x6E),
    ("TIMSK1", 0x6F),
    ("TIMSK2", 0x70),
    ("ADCL", 0x78),
    ("ADCH", 0x79),
    ("ADCSRA", 0x7A),
    ("ADCSRB", 0x7B),
    ("ADMUX", 0x7C),
    ("DIDR0", 0x7E),
    ("DIDR1", 0x7F),
    ("TCCR1A", 0x80),
    ("TCCR1B", 0x81),
    ("TCCR1C", 0x82),
    ("TCNT1L", 0x84),
    ("TCNT1H", 0x85),
    ("ICR1L", 0x86),
    ("ICR1H", 0x87),
    ("OCR1AL", 0x88),
    ("OCR1AH", 0x89),
    ("OCR1BL", 0x8A),
    ("OCR1BH", 0x8B),
    ("TCCR2A", 0xB0),
    ("TCCR2B", 0xB1),
    ("TCNT2", 0xB2),
    ("OCR2A", 0xB3),
    ("OCR2B", 0xB4),
    ("ASSR", 0xB6),
    ("TWBR", 0xB8),
    ("TWSR", 0xB9),
    ("TWAR", 0xBA),
    ("TWDR", 0xBB),
    ("TWCR", 0xBC),
    ("TWAMR", 0xBD),
    ("UCSR0A", 0xC0),
    ("UCSR0B", 0xC1),
    ("UCSR0C", 0xC2),
    ("UBRR0L", 0xC4),
    ("UBRR0H", 0xC5),
    ("UDR0", 0xC6),
];

const BIT_NAMES: &[(&str, i64)] = &[
    // TIFRn / TIMSKn
    ("TOV0", 0),
    ("OCF0A", 1),
    ("OCF0B", 2),
    ("TOV1", 0),
    ("OCF1A", 1),
    ("OCF1B", 2),
    ("ICF1", 5),
    ("TOV2", 0),
    ("OCF2A", 1),
    ("OCF2B", 2),
    ("TOIE0", 0),
    ("OCIE0A", 1),
    ("OCIE0B", 2),
    ("TOIE1", 0),
    ("OCIE1A", 1),
    ("OCIE1B", 2),
    ("ICIE1", 5),
    ("TOIE2", 0),
    ("OCIE2A", 1),
    ("OCIE2B", 2),
    // TCCR1B
    ("CS10", 0),
    ("CS11", 1),
    ("CS12", 2),
    ("WGM12", 3),
    ("WGM13", 4),
    // TCCR0B / TCCR2B
    ("CS00", 0),
    ("CS01", 1),
    ("CS02", 2),
    ("CS20", 0),
    ("CS21", 1),
    ("CS22", 2),
    // UCSR0A
    ("MPCM0", 0),
    ("U2X0", 1),
    ("UPE0", 2),
    ("DOR0", 3),
    ("FE0", 4),
    ("UDRE0", 5),
    ("TXC0", 6),
    ("RXC0", 7),
    // UCSR0B
    ("TXB80", 0),
    ("RXB80", 1),
    ("UCSZ02", 2),
    ("TXEN0", 3),
    ("RXEN0", 4),
    ("UDRIE0", 5),
    ("TXCIE0", 6),
    ("RXCIE0", 7),
    // UCSR0C
    ("UCPOL0", 0),
    ("UCSZ00", 1),
    ("UCSZ01", 2),
    ("USBS0", 3),
    ("UPM00", 4),
    ("UPM01", 5),
    ("UMSEL00", 6),
    ("UMSEL01", 7),
    // ADCSRA
    ("ADPS0", 0),
    ("ADPS1", 1),
    ("ADPS2", 2),
    ("ADIE", 3),
    ("ADIF", 4),
    ("ADATE", 5),
    ("ADSC", 6),
    ("ADEN", 7),
    // SPCR / SPSR
    ("SPR0", 0),
    ("SPR1", 1),
    ("CPHA", 2),
    ("CPOL", 3),
    ("MSTR", 4),
    ("DORD", 5),
    ("SPE", 6),
    ("SPIE", 7),
    ("SPI2X", 0),
    ("WCOL", 6),
    ("SPIF", 7),
    // EECR
    ("EERE", 0),
    ("EEPE", 1),
    ("EEMPE", 2),
    ("EERIE", 3),
];

pub fn seed(env: &mut SymbolEnv) {
    for (name, value) in IO_REGISTERS {
        env.seed_builtin(name, *value);
    }
    for (name, value) in MEM_REGISTERS {
        env.seed_builtin(name, *value);
    }
    for (name, value) in BIT_NAMES {
        env.seed_builtin(name, *value);
    }
    // Port pin names PB0..PB7, PC0..PC7, PD0..PD7.
    for port in ["PB", "PC", "PD"] {
        for bit in 0..8 {
            env.seed_builtin(&format!("{}{}", port, bit), bit);
        }
    }
}
