mod test_offer_answer_relay;
